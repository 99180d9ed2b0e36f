use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::http::ApiClient;
use crate::session::{Clock, SystemClock};
use crate::store::AuthStore;

/// Main client for a PocketBase instance
///
/// Owns the HTTP client and the auth store built from the configured
/// credentials. Both live as long as the client; the strategy is never
/// swapped.
#[derive(Debug, Clone)]
pub struct PbClient {
    api: ApiClient,
    auth: AuthStore,
}

impl PbClient {
    /// Create a new client using the system clock
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new client whose token validity follows `clock`
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let auth = AuthStore::from_config(&api, &config, clock)?;
        debug!(base_url = %config.base_url, credentials = ?config.credentials, "Created PocketBase client");

        Ok(Self { api, auth })
    }

    /// Authorize against the instance, reusing the cached token while valid
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<()> {
        self.auth.authorize().await
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.auth
    }

    /// HTTP client carrying the `Authorization` header of the last refresh
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use chrono::Duration;
    use reqwest::Method;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_authorized_client_sends_token_on_later_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/collections/users/auth-with-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc",
                "record": {"id": "u1", "email": "user@user.com"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/collections/posts_public/records"))
            .and(header("authorization", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::parse(&mock_server.uri())
            .unwrap()
            .with_user_email_password("user@user.com", "user@user.com");
        let client = PbClient::new(config).unwrap();

        client.authorize().await.unwrap();
        assert!(client.auth_store().is_valid());

        let response = client
            .api()
            .request(Method::GET, "/api/collections/posts_public/records")
            .unwrap()
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_clones_share_auth_state() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/admins/auth-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "renewed",
                "admin": {"id": "a1"}
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let clock = Arc::new(ManualClock::default());
        let config = ClientConfig::parse(&mock_server.uri())
            .unwrap()
            .with_admin_token("initial");
        let client = PbClient::with_clock(config, clock.clone()).unwrap();
        let clone = client.clone();

        client.authorize().await.unwrap();
        assert_eq!(clone.auth_store().token(), "renewed");
        assert!(clone.auth_store().is_valid());

        clock.advance(Duration::hours(2));
        assert!(!client.auth_store().is_valid());
        clone.authorize().await.unwrap();
        assert!(client.auth_store().is_valid());
    }
}
