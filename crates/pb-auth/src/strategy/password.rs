use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use super::{AuthState, Authorizer};
use crate::errors::{ClientError, Result};
use crate::http::ApiClient;
use crate::models::{AuthRecord, PasswordAuthRequest};
use crate::session::{Clock, Session};
use crate::singleflight::SingleFlight;

const OPERATION: &str = "auth";

/// Exchanges an identity and password for a token
pub struct EmailPasswordAuthorizer {
    inner: Arc<Inner>,
    flight: SingleFlight<Result<()>>,
}

struct Inner {
    state: AuthState,
    email: String,
    password: Zeroizing<String>,
}

impl EmailPasswordAuthorizer {
    /// `path` is the auth-with-password endpoint of the account kind
    pub fn new(
        client: ApiClient,
        path: &str,
        email: impl Into<String>,
        password: Zeroizing<String>,
        clock: Arc<dyn Clock>,
        lifetime: std::time::Duration,
    ) -> Result<Self, ClientError> {
        let url = client.url(path)?;

        Ok(Self {
            inner: Arc::new(Inner {
                state: AuthState::new(client, url, clock, lifetime, Session::default()),
                email: email.into(),
                password,
            }),
            flight: SingleFlight::new(),
        })
    }
}

impl Inner {
    async fn login(&self) -> Result<()> {
        if self.state.is_valid() {
            debug!("Auth token still valid, skipping login");
            return Ok(());
        }

        debug!(url = %self.state.url(), "Logging in with email and password");
        let request = self
            .state
            .client()
            .anonymous_request_to(Method::POST, self.state.url().clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&PasswordAuthRequest {
                identity: &self.email,
                password: &self.password,
            });

        self.state.exchange(OPERATION, request).await
    }
}

#[async_trait::async_trait]
impl Authorizer for EmailPasswordAuthorizer {
    #[instrument(skip(self), fields(email = %self.inner.email))]
    async fn authorize(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.flight
            .run(OPERATION, move || async move { inner.login().await })
            .await
    }

    fn is_valid(&self) -> bool {
        self.inner.state.is_valid()
    }

    fn token(&self) -> String {
        self.inner.state.token()
    }

    fn record(&self) -> Option<AuthRecord> {
        self.inner.state.record()
    }

    fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.inner.state.valid_until()
    }
}

impl fmt::Debug for EmailPasswordAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailPasswordAuthorizer")
            .field("email", &self.inner.email)
            .field("state", &self.inner.state)
            .field("flight", &self.flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::ManualClock;
    use reqwest::header::AUTHORIZATION;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_does_not_send_stale_authorization() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/admins/auth-with-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "fresh",
                "admin": {"id": "a1"}
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&ClientConfig::parse(&mock_server.uri()).unwrap()).unwrap();
        client.set_header(AUTHORIZATION, "stale").unwrap();

        let authorizer = EmailPasswordAuthorizer::new(
            client.clone(),
            "/api/admins/auth-with-password",
            "admin@admin.com",
            Zeroizing::new("pw".to_string()),
            Arc::new(ManualClock::default()),
            Duration::from_secs(3600),
        )
        .unwrap();

        authorizer.authorize().await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
        assert_eq!(client.authorization(), Some("fresh".to_string()));
        assert_eq!(authorizer.token(), "fresh");
    }

    #[test]
    fn test_debug_omits_password() {
        let client = ApiClient::new(&ClientConfig::parse("http://localhost:8090").unwrap()).unwrap();
        let authorizer = EmailPasswordAuthorizer::new(
            client,
            "/api/admins/auth-with-password",
            "admin@admin.com",
            Zeroizing::new("hunter2".to_string()),
            Arc::new(ManualClock::default()),
            Duration::from_secs(3600),
        )
        .unwrap();

        let printed = format!("{authorizer:?}");
        assert!(printed.contains("admin@admin.com"));
        assert!(!printed.contains("hunter2"));
    }
}
