//! Interchangeable ways of obtaining and refreshing a token.

mod noop;
mod password;
mod token;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::debug;
use url::Url;

use crate::errors::{AuthError, Result};
use crate::http::ApiClient;
use crate::models::{AuthRecord, AuthResponse};
use crate::session::{Clock, Session, ValidityWindow};

pub use noop::NoopAuthorizer;
pub use password::EmailPasswordAuthorizer;
pub use token::TokenAuthorizer;

/// Capability set every credential strategy provides
#[async_trait::async_trait]
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Make sure the cached token is fresh, refreshing it when the validity
    /// window has closed
    async fn authorize(&self) -> Result<()>;

    /// Whether the cached token is still inside its validity window
    fn is_valid(&self) -> bool;

    /// Cached token, empty when none was obtained yet
    fn token(&self) -> String;

    /// Cached identity record
    fn record(&self) -> Option<AuthRecord>;

    /// End of the validity window, if a token was ever issued
    fn valid_until(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// State shared by the strategies that talk to the server
///
/// The session triple is only written by `exchange`, which runs inside the
/// strategy's single-flight group.
pub(crate) struct AuthState {
    client: ApiClient,
    url: Url,
    clock: Arc<dyn Clock>,
    lifetime: chrono::Duration,
    session: RwLock<Session>,
}

impl AuthState {
    pub(crate) fn new(
        client: ApiClient,
        url: Url,
        clock: Arc<dyn Clock>,
        lifetime: std::time::Duration,
        session: Session,
    ) -> Self {
        Self {
            client,
            url,
            clock,
            lifetime: chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::MAX),
            session: RwLock::new(session),
        }
    }

    pub(crate) fn client(&self) -> &ApiClient {
        &self.client
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn token(&self) -> String {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    pub(crate) fn record(&self) -> Option<AuthRecord> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .record
            .clone()
    }

    pub(crate) fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .window
            .valid_until()
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_valid(self.clock.now())
    }

    /// Send an auth request and adopt the token it returns
    ///
    /// Nothing is written unless the server answered with a usable token, so
    /// a failed exchange leaves the previous session in place.
    pub(crate) async fn exchange(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<()> {
        let response = request
            .send()
            .await
            .map_err(|err| AuthError::transport(operation, err))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse {
                operation,
                status,
                message,
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|err| AuthError::malformed(operation, err))?;
        let header =
            HeaderValue::from_str(&auth.token).map_err(|_| AuthError::InvalidToken { operation })?;

        let token = auth.token.clone();
        let session = Session {
            token,
            record: auth.into_record(),
            window: ValidityWindow::starting_at(self.clock.now(), self.lifetime),
        };

        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        self.client.insert_header(AUTHORIZATION, header);
        *current = session;
        debug!(operation, valid_until = ?current.window.valid_until(), "Auth token refreshed");

        Ok(())
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("url", &self.url.as_str())
            .field("lifetime", &self.lifetime)
            .field("session", &*self.session.read().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}
