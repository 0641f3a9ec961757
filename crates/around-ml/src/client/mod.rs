//! Prediction client module.
//!
//! This module provides the client that performs the authenticated
//! `:predict` exchange. It wraps the `reqwest` crate.

#[allow(clippy::module_inception)]
mod client;
mod config;

pub use client::{PredictionClient, RawResponse};
pub use config::PredictionConfig;
