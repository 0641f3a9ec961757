//! Reqwest-based prediction client.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use super::PredictionConfig;
use crate::TRACING_TARGET_CLIENT as TRACING_TARGET;
use crate::auth::{AccessToken, TokenProvider};
use crate::error::{Error, Result};
use crate::request::PredictionRequest;
use crate::response::extract_score;
use crate::service::{AnnotationProvider, AnnotationService};

/// Completed HTTP exchange with the prediction service.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Full response body.
    pub body: Bytes,
}

/// Inner client that holds the HTTP client, configuration and credentials.
struct PredictionClientInner {
    http: Client,
    config: PredictionConfig,
    credentials: Box<dyn TokenProvider>,
}

/// Client for a hosted image classification model.
///
/// Every call acquires a fresh token, sends exactly one image and returns the
/// score of the first prediction. The HTTP connection pool is shared between
/// clones.
///
/// # Examples
///
/// ```rust,ignore
/// use around_ml::auth::StaticTokenProvider;
/// use around_ml::{PredictionClient, PredictionConfig};
///
/// let config = PredictionConfig::ai_platform("around-faceml", "face_abc")?;
/// let client = PredictionClient::new(config, StaticTokenProvider::new(token))?;
///
/// let score = client.annotate(&image).await?;
/// ```
#[derive(Clone)]
pub struct PredictionClient {
    inner: Arc<PredictionClientInner>,
}

impl std::fmt::Debug for PredictionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl PredictionClient {
    /// Creates a new prediction client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new<P>(config: PredictionConfig, credentials: P) -> Result<Self>
    where
        P: TokenProvider + 'static,
    {
        config.validate()?;

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %config.endpoint_url,
            timeout_ms = timeout.as_millis(),
            check_status = config.check_status,
            "Creating prediction client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let inner = PredictionClientInner {
            http,
            config,
            credentials: Box::new(credentials),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &PredictionConfig {
        &self.inner.config
    }

    /// Converts this client into an [`AnnotationService`] for use with dependency injection.
    pub fn into_service(self) -> AnnotationService {
        AnnotationService::new(self)
    }

    /// Sends `request` to the configured endpoint with `token` as bearer.
    ///
    /// Any completed exchange is returned with its full body, whatever the
    /// status; only transport failures are errors.
    pub async fn predict(
        &self,
        request: &PredictionRequest,
        token: &AccessToken,
    ) -> Result<RawResponse> {
        let body = request.to_body()?;
        let endpoint = &self.inner.config.endpoint_url;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            payload_len = body.len(),
            "Sending prediction request"
        );

        let response = self
            .inner
            .http
            .post(endpoint.clone())
            .bearer_auth(token.secret())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    endpoint = %endpoint,
                    error = %e,
                    "Prediction request failed"
                );
            })?;

        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            status_code = status.as_u16(),
            body_len = body.len(),
            "Received prediction response"
        );

        Ok(RawResponse { status, body })
    }

    /// Annotates an image and returns the score of the first prediction.
    ///
    /// Steps: acquire a token, build the request, send it, validate the
    /// response. Token acquisition is bounded by the configured timeout and
    /// its failures stop before anything is sent. The response status is only
    /// checked when [`PredictionConfig::check_status`] is set.
    pub async fn annotate(&self, image: &[u8]) -> Result<f64> {
        let config = &self.inner.config;
        let token = self.acquire_token().await?;

        let request = PredictionRequest::from_image(image);
        let response = self.predict(&request, &token).await?;

        if config.check_status && !response.status.is_success() {
            return Err(Error::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        let score = extract_score(&response.body)?;

        tracing::debug!(
            target: TRACING_TARGET,
            score,
            "Extracted prediction score"
        );

        Ok(score)
    }

    /// Checks that a token can be acquired for the configured scope.
    ///
    /// Nothing is sent to the prediction endpoint.
    pub async fn health_check(&self) -> Result<()> {
        let token = self.acquire_token().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            expires_at = ?token.expires_at(),
            "Health check acquired access token"
        );

        Ok(())
    }

    /// Acquires a token, bounded by the configured timeout.
    ///
    /// Every failure, timeout included, is reported as [`Error::Auth`].
    async fn acquire_token(&self) -> Result<AccessToken> {
        let config = &self.inner.config;
        let timeout = config.effective_timeout();
        let pending = self.inner.credentials.access_token(&config.scope);

        match tokio::time::timeout(timeout, pending).await {
            Ok(result) => result.map_err(Error::into_auth),
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    scope = %config.scope,
                    timeout_ms = timeout.as_millis(),
                    "Token acquisition timed out"
                );
                Err(Error::auth(format!(
                    "token acquisition timed out after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }

    /// Annotates an image unless `cancel` fires first.
    pub async fn annotate_with_cancel(
        &self,
        image: &[u8],
        cancel: &CancellationToken,
    ) -> Result<f64> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = self.annotate(image) => result,
        }
    }
}

#[async_trait::async_trait]
impl AnnotationProvider for PredictionClient {
    async fn annotate(&self, image: &[u8]) -> Result<f64> {
        PredictionClient::annotate(self, image).await
    }

    async fn health_check(&self) -> Result<()> {
        PredictionClient::health_check(self).await
    }
}
