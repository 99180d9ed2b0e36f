use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, Credentials};
use crate::errors::{ClientError, DecodeError, Result};
use crate::http::ApiClient;
use crate::models::AuthRecord;
use crate::session::Clock;
use crate::strategy::{Authorizer, EmailPasswordAuthorizer, NoopAuthorizer, TokenAuthorizer};

/// Auth state of a client, backed by the strategy its credentials select
///
/// Cheap to clone; clones share the strategy and therefore its cached token
/// and in-flight refresh.
#[derive(Debug, Clone)]
pub struct AuthStore {
    authorizer: Arc<dyn Authorizer>,
}

impl AuthStore {
    /// Wrap a specific strategy
    pub fn new(authorizer: impl Authorizer + 'static) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
        }
    }

    /// Pick the strategy matching the configured credentials
    ///
    /// No credentials select [`NoopAuthorizer`], an email and password select
    /// [`EmailPasswordAuthorizer`] and a token selects [`TokenAuthorizer`].
    pub fn from_config(
        client: &ApiClient,
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let store = match &config.credentials {
            Credentials::None => Self::new(NoopAuthorizer),
            Credentials::EmailPassword {
                account,
                email,
                password,
            } => Self::new(EmailPasswordAuthorizer::new(
                client.clone(),
                &account.auth_with_password_path(),
                email.clone(),
                password.clone(),
                clock,
                config.token_validity,
            )?),
            Credentials::Token { account, token } => Self::new(TokenAuthorizer::new(
                client.clone(),
                &account.auth_refresh_path(),
                token.clone(),
                clock,
                config.token_validity,
            )?),
        };

        Ok(store)
    }

    /// Make sure the token is fresh, refreshing it when needed
    ///
    /// Concurrent calls while the token is stale share a single request and
    /// its outcome. On error the previously cached token and record are kept.
    pub async fn authorize(&self) -> Result<()> {
        self.authorizer.authorize().await
    }

    pub fn is_valid(&self) -> bool {
        self.authorizer.is_valid()
    }

    pub fn token(&self) -> String {
        self.authorizer.token()
    }

    /// Raw identity record, admin or user depending on the credentials
    pub fn record(&self) -> Option<AuthRecord> {
        self.authorizer.record()
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.authorizer.valid_until()
    }

    /// Decode the identity record into `T`
    ///
    /// Returns `Ok(None)` when no record is cached, which is always the case
    /// for anonymous clients.
    pub fn model<T: DeserializeOwned>(&self) -> Result<Option<T>, DecodeError> {
        self.authorizer
            .record()
            .map(|record| serde_json::from_value(Value::Object(record)))
            .transpose()
            .map_err(DecodeError::from)
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new(NoopAuthorizer)
    }
}
