use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by `authorize()`
///
/// Cloneable because every caller that joined the same in-flight refresh
/// receives its own copy of the outcome.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("[{operation}] can't send request to pocketbase: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("[{operation}] pocketbase returned status: {status}, msg: {message}")]
    InvalidResponse {
        operation: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("[{operation}] pocketbase returned an unreadable auth response: {source}")]
    MalformedResponse {
        operation: &'static str,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("[{operation}] token can't be used as an Authorization header")]
    InvalidToken { operation: &'static str },
}

impl AuthError {
    pub(crate) fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Transport {
            operation,
            source: Arc::new(source),
        }
    }

    pub(crate) fn malformed(operation: &'static str, source: reqwest::Error) -> Self {
        Self::MalformedResponse {
            operation,
            source: Arc::new(source),
        }
    }

    /// HTTP status of a rejected auth request, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::InvalidResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server could not be reached
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// True when the server answered with a non-success status
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }
}

/// The cached auth record does not fit the requested type
#[derive(Error, Debug)]
#[error("auth record doesn't match the requested model: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

/// Errors raised while building a client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Base URL '{0}' can't carry an API path")]
    InvalidBaseUrl(String),

    #[error("Invalid header value for '{name}'")]
    InvalidHeader { name: String },
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;
