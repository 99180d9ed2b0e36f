use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped admin or user record as returned by PocketBase, in server key order
pub type AuthRecord = Map<String, Value>;

/// auth-with-password request body
#[derive(Debug, Clone, Serialize)]
pub struct PasswordAuthRequest<'a> {
    pub identity: &'a str,
    pub password: &'a str,
}

/// Response of both auth-with-password and auth-refresh
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub record: Option<AuthRecord>,
    #[serde(default)]
    pub admin: Option<AuthRecord>,
}

impl AuthResponse {
    /// The identity record the response describes
    ///
    /// A non-empty `admin` object takes precedence over `record`.
    pub fn into_record(self) -> Option<AuthRecord> {
        match self.admin {
            Some(admin) if !admin.is_empty() => Some(admin),
            _ => self.record,
        }
    }
}
