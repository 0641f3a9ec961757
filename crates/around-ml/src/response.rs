//! Prediction response types and score extraction.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// One unit of output from the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Discrete class label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub prediction: i64,
    /// Tracking key echoed from the request.
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    /// Per-class confidence scores.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: Vec<f64>,
}

/// Body of a `:predict` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predictions in instance order.
    ///
    /// Missing or `null` reads as empty: the service answers with its own
    /// error object in place of predictions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Vec<Prediction>,
}

/// Reads `null` as the default value, the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PredictionResponse {
    /// Decodes a raw response body.
    ///
    /// Fails with [`Error::EmptyResponse`] on a zero-length body and with
    /// [`Error::Decode`] when the body does not match the schema. A JSON
    /// `null` body decodes to a response without predictions.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::EmptyResponse);
        }

        serde_json::from_slice::<Option<Self>>(raw)
            .map(Option::unwrap_or_default)
            .map_err(|source| Error::Decode {
                source,
                body: String::from_utf8_lossy(raw).into_owned(),
            })
    }

    /// Returns the score at index 0 of the first prediction.
    ///
    /// `raw` is the body this response was decoded from and is attached to
    /// the error on failure.
    pub fn first_score(&self, raw: &[u8]) -> Result<f64> {
        let Some(first) = self.predictions.first() else {
            return Err(Error::NoPrediction {
                body: String::from_utf8_lossy(raw).into_owned(),
            });
        };

        first
            .scores
            .first()
            .copied()
            .ok_or_else(|| Error::MalformedPrediction {
                body: String::from_utf8_lossy(raw).into_owned(),
            })
    }
}

/// Validates a raw response body and extracts the score.
///
/// Checks run in order: empty body, JSON decoding, presence of a prediction,
/// presence of a score in the first prediction.
pub fn extract_score(raw: &[u8]) -> Result<f64> {
    PredictionResponse::parse(raw)?.first_score(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_extracts_first_score() {
        let raw = br#"{"predictions":[{"prediction":1,"key":"1","scores":[0.87,0.13]}]}"#;
        assert_eq!(extract_score(raw).unwrap(), 0.87);
    }

    #[test]
    fn test_only_first_prediction_is_examined() {
        let raw = br#"{"predictions":[
            {"prediction":0,"key":"1","scores":[0.25,0.75]},
            {"prediction":1,"key":"2","scores":[]}
        ]}"#;
        assert_eq!(extract_score(raw).unwrap(), 0.25);
    }

    #[test]
    fn test_empty_body() {
        let error = extract_score(b"").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EmptyResponseError);
    }

    #[test]
    fn test_malformed_json() {
        let error = extract_score(b"not-json").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DecodeError);
        assert_eq!(error.body(), Some("not-json"));
    }

    #[test]
    fn test_non_object_body_is_decode_error() {
        let error = extract_score(b"[1, 2, 3]").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_whitespace_body_is_decode_error() {
        let error = extract_score(b"  \n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_no_predictions_keeps_body() {
        let error = extract_score(br#"{"predictions":[]}"#).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoPredictionError);
        assert!(error.to_string().contains(r#"{"predictions":[]}"#));
    }

    #[test]
    fn test_alternate_error_schema_is_no_prediction() {
        let raw = br#"{"error":"Prediction failed: Expected image (JPEG, PNG, or GIF)"}"#;
        let error = extract_score(raw).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NoPredictionError);
        assert!(error.to_string().contains("Prediction failed"));
    }

    #[test]
    fn test_null_predictions() {
        let error = extract_score(br#"{"predictions":null}"#).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoPredictionError);
    }

    #[test]
    fn test_empty_scores() {
        let raw = br#"{"predictions":[{"prediction":1,"key":"1","scores":[]}]}"#;
        let error = extract_score(raw).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MalformedPredictionError);
        assert_eq!(error.body(), Some(std::str::from_utf8(raw).unwrap()));
    }

    #[test]
    fn test_null_body_is_no_prediction() {
        let error = extract_score(b"null").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoPredictionError);
        assert_eq!(error.body(), Some("null"));
    }

    #[test]
    fn test_null_scores_is_malformed() {
        let raw = br#"{"predictions":[{"prediction":1,"key":"1","scores":null}]}"#;
        let error = extract_score(raw).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedPredictionError);
    }

    #[test]
    fn test_null_label_and_key_are_accepted() {
        let raw = br#"{"predictions":[{"prediction":null,"key":null,"scores":[0.5]}]}"#;
        assert_eq!(extract_score(raw).unwrap(), 0.5);

        let response = PredictionResponse::parse(raw).unwrap();
        assert_eq!(response.predictions[0].prediction, 0);
        assert_eq!(response.predictions[0].key, "");
    }

    #[test]
    fn test_missing_optional_fields() {
        let response = PredictionResponse::parse(br#"{"predictions":[{"scores":[0.5]}]}"#).unwrap();

        assert_eq!(response.predictions[0].prediction, 0);
        assert_eq!(response.predictions[0].key, "");
        assert_eq!(response.predictions[0].scores, vec![0.5]);
    }
}
