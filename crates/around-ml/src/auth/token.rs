//! Access token type and OAuth2 token endpoint responses.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use serde::Deserialize;

use crate::error::{Error, Result};

/// OAuth2 bearer token.
///
/// The secret never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<Timestamp>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// Creates a token without a known expiry.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    /// Sets the expiry reported by the issuer.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the raw token for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns the expiry, if the issuer reported one.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Whether the issuer-reported expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Timestamp::now())
    }
}

/// Successful response of an OAuth2 token endpoint or the metadata server.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self, issuer: &str) -> Result<AccessToken> {
        if let Some(token_type) = &self.token_type
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(Error::auth(format!(
                "{issuer} issued unsupported token type '{token_type}'"
            )));
        }

        let secret = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::auth(format!("{issuer} response holds no access token")))?;

        let token = AccessToken::new(secret);
        let expires_at = self
            .expires_in
            .and_then(|secs| Timestamp::now().checked_add(SignedDuration::from_secs(secs)).ok());

        Ok(match expires_at {
            Some(expires_at) => token.with_expires_at(expires_at),
            None => token,
        })
    }
}

/// Reads a token endpoint response into an [`AccessToken`].
///
/// Any non-2xx status or unexpected body is an authentication failure.
pub(crate) async fn read_token_response(
    response: reqwest::Response,
    issuer: &str,
) -> Result<AccessToken> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::auth_with_source(format!("failed to read {issuer} response"), e))?;

    if !status.is_success() {
        return Err(Error::auth(format!(
            "{issuer} responded with {status}: {body}"
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| Error::auth_with_source(format!("invalid {issuer} response"), e))?;

    parsed.into_access_token(issuer)
}
