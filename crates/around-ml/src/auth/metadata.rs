//! Tokens from the instance metadata server.

use reqwest::Client;
use url::Url;

use super::token::read_token_response;
use super::{AccessToken, TRACING_TARGET, TokenProvider};
use crate::error::{Error, Result};

/// Default metadata server address.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Environment variable overriding the metadata server host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Fetches tokens for the instance's default service account.
#[derive(Debug, Clone)]
pub struct MetadataServerProvider {
    base_url: Url,
    http: Client,
}

impl MetadataServerProvider {
    /// Creates a provider for the metadata server named by
    /// `GCE_METADATA_HOST`, or the default host.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var(METADATA_HOST_ENV)
            .ok()
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_owned());

        Self::new(&format!("http://{host}"))
    }

    /// Creates a provider for a metadata server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::config(format!("invalid metadata server URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            base_url,
            http: Client::new(),
        })
    }

    /// Sends token requests through `http`.
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Returns the metadata server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn token_url(&self, scope: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(TOKEN_PATH)
            .map_err(|e| Error::config(format!("failed to construct metadata URL: {e}")))?;
        url.query_pairs_mut().append_pair("scopes", scope);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TokenProvider for MetadataServerProvider {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        let url = self.token_url(scope)?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            "Requesting token from metadata server"
        );

        let response = self
            .http
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::auth_with_source("metadata server request failed", e))?;

        read_token_response(response, "metadata server").await
    }
}
