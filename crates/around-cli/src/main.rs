#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::process;

use anyhow::Context;
use around_ml::PredictionClient;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "around_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "around_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "around_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "annotation failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    log_startup_info();
    cli.log();

    let image = cli.read_image().await?;
    let credentials = cli.credentials().await?;
    let client = PredictionClient::new(cli.prediction.clone(), credentials)
        .context("failed to create prediction client")?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let score = client
        .annotate_with_cancel(&image, &cancel)
        .await
        .inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET_SHUTDOWN,
                kind = %error.kind(),
                auth_related = error.is_auth_related(),
                "prediction call failed"
            );
        })
        .context("failed to annotate image")?;

    tracing::info!(target: TRACING_TARGET_SHUTDOWN, score, "annotation completed");
    println!("{score}");

    Ok(())
}

/// Cancels `cancel` when the process receives Ctrl-C.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: TRACING_TARGET_SHUTDOWN, "interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

/// Logs startup information.
fn log_startup_info() {
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?enabled_features(),
        "starting around-cli"
    );
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
