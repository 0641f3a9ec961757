#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod auth;
mod client;
mod error;
pub mod request;
pub mod response;
mod service;

pub use crate::auth::{AccessToken, TokenProvider};
pub use crate::client::{PredictionClient, PredictionConfig, RawResponse};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::request::{ImagePayload, Instance, PredictionRequest};
pub use crate::response::{Prediction, PredictionResponse, extract_score};
pub use crate::service::{AnnotationProvider, AnnotationService};

/// Tracing target for prediction client operations.
pub const TRACING_TARGET_CLIENT: &str = "around_ml::client";

/// Tracing target for the annotation service wrapper.
pub const TRACING_TARGET_SERVICE: &str = "around_ml::service";
