//! Google credentials JSON files.

use std::path::Path;

use serde::Deserialize;

use super::GOOGLE_TOKEN_URI;
use crate::error::{Error, Result};

/// Contents of a Google credentials file, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    /// User credentials written by `gcloud auth application-default login`.
    AuthorizedUser(AuthorizedUserKey),
    /// Service account key downloaded from the cloud console.
    ServiceAccount(ServiceAccountKey),
}

/// OAuth2 client and refresh token of a user.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserKey {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Token endpoint; Google's when absent.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for AuthorizedUserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserKey")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Service account identity and RSA signing key.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email, used as the JWT issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Key identifier, sent as the JWT `kid`.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint; Google's when absent.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_owned()
}

impl CredentialsFile {
    /// Parses credentials from JSON.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json)
            .map_err(|e| Error::auth_with_source("unsupported or invalid credentials file", e))
    }

    /// Reads and parses a credentials file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read(path).await.map_err(|e| {
            Error::auth_with_source(
                format!("failed to read credentials file '{}'", path.display()),
                e,
            )
        })?;

        Self::from_json(&json)
    }
}
