use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::ClientError;

/// HTTP client bound to one PocketBase instance
///
/// Carries a set of default headers applied to every request it builds.
/// Clones share those headers, so an `Authorization` header set by a
/// successful token refresh authenticates every later request made through
/// any clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    default_headers: Arc<RwLock<HeaderMap>>,
}

impl ApiClient {
    /// Build the underlying reqwest client from the config
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("pb-client"))
            .build()?;

        Self::with_http(http, config.base_url.clone())
    }

    /// Wrap an existing reqwest client
    pub fn with_http(http: Client, base_url: Url) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http,
            base_url,
            default_headers: Arc::new(RwLock::new(HeaderMap::new())),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of an API path such as `/api/admins/auth-refresh`
    ///
    /// The path is appended to the base URL, so instances served under a
    /// prefix keep it.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Set a header sent with every subsequent request
    pub fn set_header(&self, name: HeaderName, value: &str) -> Result<(), ClientError> {
        let value = HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader {
            name: name.to_string(),
        })?;
        self.insert_header(name, value);
        Ok(())
    }

    pub(crate) fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
    }

    /// Current value of a default header
    pub fn header(&self, name: &HeaderName) -> Option<String> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    /// Token currently sent as `Authorization`, if any
    pub fn authorization(&self) -> Option<String> {
        self.header(&AUTHORIZATION)
    }

    /// Snapshot of the default headers
    pub fn default_headers(&self) -> HeaderMap {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Request to an API path carrying the default headers
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.request_to(method, self.url(path)?))
    }

    /// Request to an absolute URL carrying the default headers
    pub fn request_to(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).headers(self.default_headers())
    }

    /// Request to an absolute URL carrying the default headers except
    /// `Authorization`
    pub fn anonymous_request_to(&self, method: Method, url: Url) -> RequestBuilder {
        let mut headers = self.default_headers();
        headers.remove(AUTHORIZATION);
        self.http.request(method, url).headers(headers)
    }
}
