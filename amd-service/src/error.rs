//! Error types for amd-service
//!
//! Decode and inference failures are the only errors a single request can
//! produce. Engine load failures never reach a request: they leave the
//! engine in `LoadFailed` and requests are answered by the fallback.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Audio could not be turned into a waveform
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Audio payload is empty")]
    Empty,

    /// No container format recognised the bytes
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("No decodable audio track found")]
    NoTrack,

    #[error("Audio track has no sample rate")]
    MissingSampleRate,

    /// Unrecoverable codec or container error
    #[error("Audio decode failed: {0}")]
    Codec(String),

    #[error("Audio decoded to zero samples")]
    NoSamples,

    #[error("Resampling failed: {0}")]
    Resample(String),
}

/// The forward pass failed
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model input is empty")]
    EmptyInput,

    #[error("Unexpected tensor shape: {0}")]
    Shape(String),

    /// Scores that cannot be turned into probabilities
    #[error("Model produced non-finite scores ({0}, {1})")]
    NonFinite(f32, f32),

    /// Failure reported by the inference runtime
    #[error("Inference runtime error: {0}")]
    Runtime(String),
}

/// The model could not be loaded at startup
#[derive(Debug, Error)]
pub enum EngineLoadError {
    #[error("No model path configured")]
    NotConfigured,

    #[error("Failed to read model {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model: {0}")]
    Invalid(String),

    /// Backend requested but not compiled in
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Inference runtime error: {0}")]
    Runtime(String),
}

/// Per-request pipeline failure
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// HTTP-facing error
///
/// Every variant renders as `{"detail": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pipeline failure (500)
    #[error(transparent)]
    Prediction(#[from] PredictError),

    /// Request rejected before reaching the pipeline
    #[error("{1}")]
    Rejected(StatusCode, String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Malformed or incomplete multipart form (422)
    pub fn unprocessable(message: impl Into<String>) -> Self {
        ApiError::Rejected(StatusCode::UNPROCESSABLE_ENTITY, message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Prediction(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(status, _) => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Convenience Result type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_error_is_500() {
        let err = ApiError::from(PredictError::from(DecodeError::Empty));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Audio payload is empty");
    }

    #[test]
    fn test_unprocessable_keeps_message() {
        let err = ApiError::unprocessable("Missing multipart field 'audio'");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Missing multipart field 'audio'");
    }

    #[test]
    fn test_load_error_names_path() {
        let err = EngineLoadError::Io {
            path: PathBuf::from("/models/probe.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/models/probe.json"));
    }
}
