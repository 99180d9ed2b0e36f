use super::Authorizer;
use crate::errors::Result;
use crate::models::AuthRecord;

/// Strategy used when no credentials are configured
///
/// Never holds a token and never talks to the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuthorizer;

#[async_trait::async_trait]
impl Authorizer for NoopAuthorizer {
    async fn authorize(&self) -> Result<()> {
        Ok(())
    }

    fn is_valid(&self) -> bool {
        false
    }

    fn token(&self) -> String {
        String::new()
    }

    fn record(&self) -> Option<AuthRecord> {
        None
    }
}
