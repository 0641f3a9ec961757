//! Annotation service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::TRACING_TARGET_SERVICE as TRACING_TARGET;
use crate::error::Result;

/// Core trait for image annotation.
///
/// Implement this trait to plug another scoring backend, or a fake in tests,
/// behind [`AnnotationService`].
#[async_trait::async_trait]
pub trait AnnotationProvider: Send + Sync {
    /// Scores an image.
    async fn annotate(&self, image: &[u8]) -> Result<f64>;

    /// Performs a health check on the annotation provider.
    async fn health_check(&self) -> Result<()>;
}

/// Annotation service wrapper with observability.
///
/// This wrapper adds structured logging and timing to any annotation
/// implementation. The inner provider is wrapped in `Arc` for cheap cloning,
/// so concurrent callers can each hold a handle.
#[derive(Clone)]
pub struct AnnotationService {
    inner: Arc<dyn AnnotationProvider>,
}

impl fmt::Debug for AnnotationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationService").finish_non_exhaustive()
    }
}

impl AnnotationService {
    /// Create a new annotation service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: AnnotationProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Scores an image, logging the outcome.
    pub async fn annotate(&self, image: &[u8]) -> Result<f64> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            image_len = image.len(),
            "Annotating image"
        );

        let result = self.inner.annotate(image).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(score) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    score,
                    elapsed_ms = elapsed.as_millis(),
                    "Image annotated"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    kind = %error.kind(),
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Image annotation failed"
                );
            }
        }

        result
    }

    /// Performs a health check on the underlying provider.
    pub async fn health_check(&self) -> Result<()> {
        let result = self.inner.health_check().await;

        if let Err(error) = &result {
            tracing::warn!(
                target: TRACING_TARGET,
                kind = %error.kind(),
                error = %error,
                "Annotation provider health check failed"
            );
        }

        result
    }
}
