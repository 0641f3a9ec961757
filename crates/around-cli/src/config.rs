//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── prediction: PredictionConfig  # Endpoint, scope, timeout, status check
//! ├── access_token: Option<String>  # Static token, else application defaults
//! └── image: PathBuf                # Image file, or `-` for stdin
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::path::PathBuf;

use anyhow::Context;
use around_ml::PredictionConfig;
use around_ml::auth::{DefaultCredentials, StaticTokenProvider, TokenProvider};
use clap::Parser;
use tokio::io::AsyncReadExt;

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "around")]
#[command(about = "Score an image with a hosted classification model")]
#[command(version)]
pub struct Cli {
    /// Prediction endpoint configuration.
    #[clap(flatten)]
    pub prediction: PredictionConfig,

    /// Pre-minted bearer token; application default credentials otherwise
    #[arg(long = "ml-access-token", env = "ML_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Image to score, or `-` to read from stdin
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// .env files are loaded before clap parses arguments so that variables
    /// from .env act as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Builds the token provider selected by the configuration.
    pub async fn credentials(&self) -> anyhow::Result<Box<dyn TokenProvider>> {
        if let Some(token) = &self.access_token {
            tracing::info!(target: TRACING_TARGET_CONFIG, "Using static access token");
            return Ok(Box::new(StaticTokenProvider::new(token.clone())));
        }

        let credentials = DefaultCredentials::discover()
            .await
            .context("failed to discover application default credentials")?;
        Ok(Box::new(credentials))
    }

    /// Reads the image bytes from the file or stdin.
    pub async fn read_image(&self) -> anyhow::Result<Vec<u8>> {
        if self.image.as_os_str() == "-" {
            let mut image = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut image)
                .await
                .context("failed to read image from stdin")?;
            return Ok(image);
        }

        tokio::fs::read(&self.image)
            .await
            .with_context(|| format!("failed to read image '{}'", self.image.display()))
    }

    /// Logs the effective configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            endpoint = %self.prediction.endpoint_url,
            scope = %self.prediction.scope,
            timeout_secs = self.prediction.effective_timeout().as_secs(),
            check_status = self.prediction.check_status,
            static_token = self.access_token.is_some(),
            image = %self.image.display(),
            "prediction configuration"
        );
    }
}
