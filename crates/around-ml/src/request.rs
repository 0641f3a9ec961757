//! Prediction request types.
//!
//! The wire schema is fixed by the prediction service:
//!
//! ```json
//! { "instances": [ { "image_bytes": { "b64": "<base64>" }, "key": "1" } ] }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tracking key attached to the single instance of every request.
///
/// The service echoes it back for correlation; its value is otherwise inert.
pub const DEFAULT_INSTANCE_KEY: &str = "1";

/// Base64-encoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Standard base64 (padded) encoding of the image.
    pub b64: String,
}

impl ImagePayload {
    /// Encodes raw image bytes.
    pub fn encode(bytes: &[u8]) -> Self {
        Self {
            b64: STANDARD.encode(bytes),
        }
    }

    /// Decodes the payload back into raw image bytes.
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.b64)
    }
}

/// One unit of input submitted to the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Encoded image.
    pub image_bytes: ImagePayload,
    /// Opaque tracking key.
    pub key: String,
}

/// Body of a `:predict` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Instances to classify; always exactly one here.
    pub instances: Vec<Instance>,
}

impl PredictionRequest {
    /// Builds a request holding a single instance for `image`.
    ///
    /// Empty input is passed through unchanged; the service decides whether
    /// to reject it.
    pub fn from_image(image: &[u8]) -> Self {
        Self {
            instances: vec![Instance {
                image_bytes: ImagePayload::encode(image),
                key: DEFAULT_INSTANCE_KEY.to_owned(),
            }],
        }
    }

    /// Serializes the request into a JSON body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_instance_with_constant_key() {
        let request = PredictionRequest::from_image(b"\xff\xd8\xff\xe0jpeg");

        assert_eq!(request.instances.len(), 1);
        assert_eq!(request.instances[0].key, DEFAULT_INSTANCE_KEY);
    }

    #[test]
    fn test_payload_decodes_to_original_bytes() {
        let samples: [&[u8]; 4] = [b"a", b"ab", b"abc", &[0, 1, 2, 253, 254, 255]];

        for image in samples {
            let request = PredictionRequest::from_image(image);
            let decoded = request.instances[0].image_bytes.decode().unwrap();
            assert_eq!(decoded, image);
        }
    }

    #[test]
    fn test_empty_image_is_passed_through() {
        let request = PredictionRequest::from_image(&[]);
        assert_eq!(request.instances[0].image_bytes.b64, "");
    }

    #[test]
    fn test_wire_schema() {
        let body = PredictionRequest::from_image(b"hello").to_body().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "instances": [
                    { "image_bytes": { "b64": "aGVsbG8=" }, "key": "1" }
                ]
            })
        );
    }
}
