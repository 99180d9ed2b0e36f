//! Credential management for PocketBase clients
//!
//! This crate obtains, caches and refreshes the token a PocketBase client
//! authenticates with, and exposes the authenticated admin or user record.
//!
//! # Strategies
//!
//! The configured credentials select one strategy for the lifetime of the
//! client:
//!
//! 1. No credentials: anonymous, never holds a token
//! 2. Email and password: `auth-with-password` on first use and after expiry
//! 3. Token: the supplied token is sent right away and renewed through
//!    `auth-refresh` once its validity window closed
//!
//! A token is trusted for 60 minutes after it was issued. Concurrent calls to
//! `authorize()` while it is stale collapse into one request whose outcome
//! every caller shares.
//!
//! # Example
//!
//! ```no_run
//! use pb_auth::{ClientConfig, PbClient};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::parse("http://localhost:8090")?
//!         .with_user_email_password("user@user.com", "user@user.com");
//!     let client = PbClient::new(config)?;
//!
//!     client.authorize().await?;
//!
//!     if let Some(user) = client.auth_store().model::<User>()? {
//!         println!("Logged in as: {}", user.email);
//!     }
//!
//!     // Every request built through the client now carries the token
//!     let _request = client.api().request(reqwest::Method::GET, "/api/collections/posts/records")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Anonymous Clients
//!
//! ```
//! use pb_auth::{ClientConfig, PbClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = PbClient::new(ClientConfig::parse("http://localhost:8090")?)?;
//!
//! client.authorize().await?;
//! assert!(!client.auth_store().is_valid());
//! assert_eq!(client.auth_store().token(), "");
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! # Important Notes
//!
//! - A successful refresh sets the `Authorization` default header of the
//!   client's [`ApiClient`], authenticating every later request
//! - Failed refreshes keep the previously cached token and record
//! - Tokens and passwords are never logged

pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod session;
pub mod singleflight;
pub mod store;
pub mod strategy;

// Re-export main types
pub use client::PbClient;
pub use config::{AccountKind, ClientConfig, Credentials, HttpTimeouts};
pub use errors::{AuthError, ClientError, DecodeError, Result};
pub use http::ApiClient;
pub use models::{AuthRecord, AuthResponse};
pub use session::{Clock, ManualClock, Session, SystemClock, ValidityWindow};
pub use singleflight::SingleFlight;
pub use store::AuthStore;
pub use strategy::{Authorizer, EmailPasswordAuthorizer, NoopAuthorizer, TokenAuthorizer};
