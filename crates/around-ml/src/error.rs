//! Structured error handling for annotation requests.

use reqwest::StatusCode;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while annotating an image.
///
/// Obtained through [`Error::kind`] so callers can branch on the failure
/// without matching on variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Bearer token could not be acquired.
    AuthError,
    /// Transport-level failure during the HTTP exchange.
    NetworkError,
    /// Prediction request could not be serialized.
    SerializationError,
    /// Non-2xx status, only reported when status checking is enabled.
    StatusError,
    /// Zero-length response body.
    EmptyResponseError,
    /// Response body is not valid JSON for the expected schema.
    DecodeError,
    /// Response decoded but holds no predictions.
    NoPredictionError,
    /// First prediction holds no scores.
    MalformedPredictionError,
    /// Caller cancelled the operation.
    Cancelled,
    /// Invalid client configuration.
    ConfigError,
}

/// Error type for annotation requests.
///
/// Variants that originate from the response body keep the raw body so the
/// diagnostic survives past logging.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential acquisition failed.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the failure.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// HTTP exchange failed at the transport level.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Prediction request could not be encoded.
    #[error("failed to encode prediction request: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Prediction service responded with a non-2xx status.
    #[error("prediction service responded with {status}: {body}")]
    Status {
        /// HTTP status of the response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },

    /// Prediction service returned an empty body.
    ///
    /// The service does this instead of returning an HTTP error, usually
    /// because of an authentication problem.
    #[error("empty response from prediction service")]
    EmptyResponse,

    /// Response body could not be decoded.
    #[error("failed to decode prediction response: {source}")]
    Decode {
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
        /// Raw response body.
        body: String,
    },

    /// Response holds no predictions; the body is the service's own error.
    #[error("prediction response holds no predictions: {body}")]
    NoPrediction {
        /// Raw response body.
        body: String,
    },

    /// First prediction holds an empty score list.
    #[error("prediction response holds no scores: {body}")]
    MalformedPrediction {
        /// Raw response body.
        body: String,
    },

    /// Operation was cancelled by the caller.
    #[error("annotation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication error with an underlying source.
    pub fn auth_with_source(message: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Auth {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::AuthError,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Serialization(_) => ErrorKind::SerializationError,
            Self::Status { .. } => ErrorKind::StatusError,
            Self::EmptyResponse => ErrorKind::EmptyResponseError,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::NoPrediction { .. } => ErrorKind::NoPredictionError,
            Self::MalformedPrediction { .. } => ErrorKind::MalformedPredictionError,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::ConfigError,
        }
    }

    /// Returns the raw response body carried by this error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. }
            | Self::Decode { body, .. }
            | Self::NoPrediction { body }
            | Self::MalformedPrediction { body } => Some(body),
            _ => None,
        }
    }

    /// Whether the failure points at credentials.
    ///
    /// An empty response body counts: the service answers that way when the
    /// token is rejected.
    #[must_use]
    pub fn is_auth_related(&self) -> bool {
        match self {
            Self::Auth { .. } | Self::EmptyResponse => true,
            Self::Status { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }

    /// Wraps any error raised during token acquisition as [`Error::Auth`].
    pub(crate) fn into_auth(self) -> Self {
        match self {
            Self::Auth { .. } => self,
            other => Self::auth_with_source("failed to acquire access token", other),
        }
    }
}
