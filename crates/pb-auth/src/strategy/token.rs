use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use super::{AuthState, Authorizer};
use crate::errors::{ClientError, Result};
use crate::http::ApiClient;
use crate::models::AuthRecord;
use crate::session::{Clock, Session};
use crate::singleflight::SingleFlight;

const OPERATION: &str = "auth-refresh";

/// Keeps a token obtained elsewhere alive through the auth-refresh endpoint
pub struct TokenAuthorizer {
    state: Arc<AuthState>,
    flight: SingleFlight<Result<()>>,
}

impl TokenAuthorizer {
    /// `path` is the auth-refresh endpoint of the account kind
    ///
    /// The token becomes the client's default `Authorization` header right
    /// away, before the first refresh.
    pub fn new(
        client: ApiClient,
        path: &str,
        token: impl Into<String>,
        clock: Arc<dyn Clock>,
        lifetime: std::time::Duration,
    ) -> Result<Self, ClientError> {
        let token = token.into();
        let url = client.url(path)?;
        client.set_header(AUTHORIZATION, &token)?;

        Ok(Self {
            state: Arc::new(AuthState::new(
                client,
                url,
                clock,
                lifetime,
                Session::with_token(token),
            )),
            flight: SingleFlight::new(),
        })
    }
}

async fn refresh(state: &AuthState) -> Result<()> {
    if state.is_valid() {
        debug!("Auth token still valid, skipping refresh");
        return Ok(());
    }

    debug!(url = %state.url(), "Refreshing auth token");
    let request = state
        .client()
        .request_to(Method::POST, state.url().clone())
        .header(CONTENT_TYPE, "application/json")
        .headers(authorization(&state.token()));

    state.exchange(OPERATION, request).await
}

/// Replaces whatever `Authorization` the client defaults carry
fn authorization(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(token) {
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

#[async_trait::async_trait]
impl Authorizer for TokenAuthorizer {
    #[instrument(skip(self))]
    async fn authorize(&self) -> Result<()> {
        let state = Arc::clone(&self.state);
        self.flight
            .run(OPERATION, move || async move { refresh(&state).await })
            .await
    }

    fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    fn token(&self) -> String {
        self.state.token()
    }

    fn record(&self) -> Option<AuthRecord> {
        self.state.record()
    }

    fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.state.valid_until()
    }
}

impl fmt::Debug for TokenAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthorizer")
            .field("state", &self.state)
            .field("flight", &self.flight)
            .finish()
    }
}
