//! JWT bearer grant for service accounts.

use jiff::Timestamp;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::Serialize;

use super::token::read_token_response;
use super::{AccessToken, ServiceAccountKey, TRACING_TARGET, TokenProvider};
use crate::error::{Error, Result};

/// OAuth2 grant type for signed JWT assertions.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of the signed assertion, in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs an RS256 assertion with a service account key and exchanges it for
/// an access token.
#[derive(Clone)]
pub struct ServiceAccountProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: Client,
}

impl std::fmt::Debug for ServiceAccountProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountProvider")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountProvider {
    /// Creates a provider with a default HTTP client.
    ///
    /// Fails when the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        Self::with_http_client(key, Client::new())
    }

    /// Creates a provider that sends token requests through `http`.
    pub fn with_http_client(key: ServiceAccountKey, http: Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::auth_with_source("invalid service account private key", e))?;

        Ok(Self {
            key,
            encoding_key,
            http,
        })
    }

    /// Returns the service account email.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Builds the signed assertion for `scope`, issued at `issued_at`.
    fn assertion(&self, scope: &str, issued_at: Timestamp) -> Result<String> {
        let iat = issued_at.as_second();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| Error::auth_with_source("failed to sign service account assertion", e))
    }
}

#[async_trait::async_trait]
impl TokenProvider for ServiceAccountProvider {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        tracing::debug!(
            target: TRACING_TARGET,
            token_uri = %self.key.token_uri,
            client_email = %self.key.client_email,
            scope,
            "Exchanging service account assertion"
        );

        let assertion = self.assertion(scope, Timestamp::now())?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::auth_with_source("token endpoint request failed", e))?;

        read_token_response(response, "token endpoint").await
    }
}
