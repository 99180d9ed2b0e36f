use std::fmt;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::errors::ClientError;

/// PocketBase authentication endpoints, relative to the base URL
pub mod endpoints {
    pub const ADMIN_AUTH_WITH_PASSWORD: &str = "/api/admins/auth-with-password";
    pub const ADMIN_AUTH_REFRESH: &str = "/api/admins/auth-refresh";

    pub fn collection_auth_with_password(collection: &str) -> String {
        format!("/api/collections/{collection}/auth-with-password")
    }

    pub fn collection_auth_refresh(collection: &str) -> String {
        format!("/api/collections/{collection}/auth-refresh")
    }
}

/// Auth collection used by `with_user_*` options
pub const DEFAULT_AUTH_COLLECTION: &str = "users";

/// How long a freshly issued token is trusted before it is refreshed
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Kind of account the credentials belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    /// Instance administrator
    Admin,

    /// Record of an auth collection, `users` unless configured otherwise
    Collection(String),
}

impl AccountKind {
    pub fn users() -> Self {
        Self::Collection(DEFAULT_AUTH_COLLECTION.to_string())
    }

    pub fn auth_with_password_path(&self) -> String {
        match self {
            Self::Admin => endpoints::ADMIN_AUTH_WITH_PASSWORD.to_string(),
            Self::Collection(name) => endpoints::collection_auth_with_password(name),
        }
    }

    pub fn auth_refresh_path(&self) -> String {
        match self {
            Self::Admin => endpoints::ADMIN_AUTH_REFRESH.to_string(),
            Self::Collection(name) => endpoints::collection_auth_refresh(name),
        }
    }
}

impl From<String> for AccountKind {
    /// `admin` selects the admin endpoints, anything else names a collection
    fn from(account: String) -> Self {
        if account == "admin" {
            Self::Admin
        } else {
            Self::Collection(account)
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        Self::users()
    }
}

/// Credentials a client authenticates with
///
/// The variant picks the strategy behind the auth store and never changes for
/// the lifetime of the client.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Anonymous access
    #[default]
    None,

    /// Identity and password exchanged for a token on first use
    EmailPassword {
        account: AccountKind,
        email: String,
        password: Zeroizing<String>,
    },

    /// Token obtained elsewhere, kept alive through the refresh endpoint
    Token { account: AccountKind, token: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::EmailPassword { account, email, .. } => f
                .debug_struct("EmailPassword")
                .field("account", account)
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::Token { account, .. } => f
                .debug_struct("Token")
                .field("account", account)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for PbClient
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// PocketBase instance, e.g. `http://localhost:8090`
    pub base_url: Url,

    /// Credentials, `Credentials::None` for anonymous access
    pub credentials: Credentials,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,

    /// Lifetime of a token after a successful refresh
    pub token_validity: Duration,
}

impl ClientConfig {
    /// Create an anonymous config for the given instance
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            credentials: Credentials::None,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some("pb-client".to_string()),
            token_validity: TOKEN_VALIDITY,
        }
    }

    /// Parse the base URL and create an anonymous config
    pub fn parse(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn with_admin_email_password(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_email_password(AccountKind::Admin, email, password)
    }

    pub fn with_user_email_password(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_email_password(AccountKind::users(), email, password)
    }

    pub fn with_collection_email_password(
        self,
        collection: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.with_email_password(AccountKind::Collection(collection.into()), email, password)
    }

    pub fn with_email_password(
        mut self,
        account: AccountKind,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Credentials::EmailPassword {
            account,
            email: email.into(),
            password: Zeroizing::new(password.into()),
        };
        self
    }

    pub fn with_admin_token(self, token: impl Into<String>) -> Self {
        self.with_token(AccountKind::Admin, token)
    }

    pub fn with_user_token(self, token: impl Into<String>) -> Self {
        self.with_token(AccountKind::users(), token)
    }

    pub fn with_collection_token(self, collection: impl Into<String>, token: impl Into<String>) -> Self {
        self.with_token(AccountKind::Collection(collection.into()), token)
    }

    pub fn with_token(mut self, account: AccountKind, token: impl Into<String>) -> Self {
        self.credentials = Credentials::Token {
            account,
            token: token.into(),
        };
        self
    }

    pub fn with_http_timeouts(mut self, http_timeouts: HttpTimeouts) -> Self {
        self.http_timeouts = http_timeouts;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_token_validity(mut self, token_validity: Duration) -> Self {
        self.token_validity = token_validity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_paths() {
        assert_eq!(
            AccountKind::Admin.auth_with_password_path(),
            "/api/admins/auth-with-password"
        );
        assert_eq!(AccountKind::Admin.auth_refresh_path(), "/api/admins/auth-refresh");
        assert_eq!(
            AccountKind::users().auth_with_password_path(),
            "/api/collections/users/auth-with-password"
        );
        assert_eq!(
            AccountKind::Collection("staff".to_string()).auth_refresh_path(),
            "/api/collections/staff/auth-refresh"
        );
    }

    #[test]
    fn test_account_from_name() {
        assert_eq!(AccountKind::from("admin".to_string()), AccountKind::Admin);
        assert_eq!(AccountKind::from("users".to_string()), AccountKind::users());
    }

    #[test]
    fn test_builder_selects_credentials() {
        let config = ClientConfig::parse("http://localhost:8090")
            .unwrap()
            .with_admin_email_password("admin@admin.com", "secret");

        match &config.credentials {
            Credentials::EmailPassword { account, email, password } => {
                assert_eq!(account, &AccountKind::Admin);
                assert_eq!(email, "admin@admin.com");
                assert_eq!(password.as_str(), "secret");
            }
            other => panic!("Expected EmailPassword credentials, got {other:?}"),
        }

        let config = config.with_user_token("tok");
        assert!(matches!(
            config.credentials,
            Credentials::Token { ref account, ref token } if account == &AccountKind::users() && token == "tok"
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig::parse("http://localhost:8090")
            .unwrap()
            .with_user_email_password("user@user.com", "hunter2");
        let printed = format!("{config:?}");

        assert!(printed.contains("user@user.com"));
        assert!(!printed.contains("hunter2"));

        let printed = format!("{:?}", config.with_admin_token("very-secret-token"));
        assert!(!printed.contains("very-secret-token"));
    }
}
