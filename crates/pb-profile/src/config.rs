use std::fmt;

use serde::{Deserialize, Serialize};

fn default_account() -> String {
    pb_auth::config::DEFAULT_AUTH_COLLECTION.to_string()
}

/// How the profile authenticates
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthSection {
    Password {
        /// `admin` or the name of an auth collection
        #[serde(default = "default_account")]
        account: String,
        email: String,
        password: String,
    },
    Token {
        #[serde(default = "default_account")]
        account: String,
        token: String,
    },
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { account, email, .. } => f
                .debug_struct("Password")
                .field("account", account)
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Token { account, .. } => f
                .debug_struct("Token")
                .field("account", account)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSection {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub token_validity_minutes: Option<u64>,
}
