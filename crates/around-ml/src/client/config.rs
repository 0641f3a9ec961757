//! Prediction client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::CLOUD_PLATFORM_SCOPE;
use crate::error::{Error, Result};

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URL of the Cloud ML Engine / AI Platform API.
const AI_PLATFORM_BASE_URL: &str = "https://ml.googleapis.com/v1";

/// Configuration for the prediction client.
///
/// Endpoint and scope identify the model deployment and are supplied by the
/// caller; nothing here is derived from process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PredictionConfig {
    /// Prediction endpoint URL (`...:predict`)
    #[cfg_attr(
        feature = "config",
        arg(long = "ml-endpoint", env = "ML_ENDPOINT_URL")
    )]
    pub endpoint_url: Url,

    /// OAuth2 scope requested for the bearer token
    #[cfg_attr(
        feature = "config",
        arg(long = "ml-scope", env = "ML_SCOPE", default_value = CLOUD_PLATFORM_SCOPE)
    )]
    #[serde(default = "default_scope")]
    pub scope: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "ml-timeout", env = "ML_HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "ml-user-agent", env = "ML_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Fail on non-2xx responses instead of judging the body alone
    #[cfg_attr(
        feature = "config",
        arg(long = "ml-check-status", env = "ML_CHECK_STATUS")
    )]
    #[serde(default)]
    pub check_status: bool,
}

fn default_scope() -> String {
    CLOUD_PLATFORM_SCOPE.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl PredictionConfig {
    /// Creates a configuration for `endpoint_url` with the cloud-platform scope.
    pub fn new(endpoint_url: Url) -> Self {
        Self {
            endpoint_url,
            scope: default_scope(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
            check_status: false,
        }
    }

    /// Creates a configuration for a model hosted on AI Platform.
    pub fn ai_platform(project: &str, model: &str) -> Result<Self> {
        let url = format!("{AI_PLATFORM_BASE_URL}/projects/{project}/models/{model}:predict");
        let endpoint_url = Url::parse(&url)
            .map_err(|e| Error::config(format!("invalid endpoint URL '{url}': {e}")))?;

        Ok(Self::new(endpoint_url))
    }

    /// Checks that the endpoint is HTTP(S) and the scope is set.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.endpoint_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "endpoint URL must use http or https, got '{}'",
                self.endpoint_url.scheme()
            )));
        }

        if self.scope.trim().is_empty() {
            return Err(Error::config("OAuth2 scope must not be empty"));
        }

        Ok(())
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("around-ml/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the OAuth2 scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable or disable failing on non-2xx responses.
    #[must_use]
    pub fn with_check_status(mut self, check_status: bool) -> Self {
        self.check_status = check_status;
        self
    }
}
