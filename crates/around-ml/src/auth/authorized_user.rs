//! Refresh-token exchange for user credentials.

use reqwest::Client;

use super::token::read_token_response;
use super::{AccessToken, AuthorizedUserKey, CLOUD_PLATFORM_SCOPE, TRACING_TARGET, TokenProvider};
use crate::error::{Error, Result};

/// Exchanges a user's refresh token for an access token.
///
/// The scopes of the resulting token are the ones the user consented to;
/// the requested scope is not sent.
#[derive(Debug, Clone)]
pub struct AuthorizedUserProvider {
    key: AuthorizedUserKey,
    http: Client,
}

impl AuthorizedUserProvider {
    /// Creates a provider with a default HTTP client.
    pub fn new(key: AuthorizedUserKey) -> Self {
        Self::with_http_client(key, Client::new())
    }

    /// Creates a provider that sends token requests through `http`.
    pub fn with_http_client(key: AuthorizedUserKey, http: Client) -> Self {
        Self { key, http }
    }
}

#[async_trait::async_trait]
impl TokenProvider for AuthorizedUserProvider {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        if scope != CLOUD_PLATFORM_SCOPE {
            tracing::warn!(
                target: TRACING_TARGET,
                scope,
                "User credentials ignore the requested scope"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET,
            token_uri = %self.key.token_uri,
            client_id = %self.key.client_id,
            scope,
            "Refreshing user access token"
        );

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.key.client_id.as_str()),
                ("client_secret", self.key.client_secret.as_str()),
                ("refresh_token", self.key.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::auth_with_source("token endpoint request failed", e))?;

        read_token_response(response, "token endpoint").await
    }
}
