//! Pre-minted bearer token.

use super::{AccessToken, TokenProvider};
use crate::error::{Error, Result};

/// Hands out the same token for every scope.
///
/// Useful for tokens minted outside the process, for example with
/// `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a provider for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self, _scope: &str) -> Result<AccessToken> {
        if self.token.secret().is_empty() {
            return Err(Error::auth("static access token is empty"));
        }

        Ok(self.token.clone())
    }
}
