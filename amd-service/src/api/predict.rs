//! Prediction endpoints
//!
//! `POST /predict` and `POST /predict-stream` take a multipart form with an
//! `audio` file part. Both classify the part independently; the stream route
//! keeps no per-call state.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::audio::AudioHint;
use crate::error::{ApiError, ApiResult};
use crate::service::{AudioClip, PredictionResult};
use crate::AppState;

/// Multipart field holding the clip
pub const AUDIO_FIELD: &str = "audio";

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResult>> {
    let mut multipart = multipart.map_err(|e| rejected(e.status(), e.body_text()))?;
    let clip = read_audio_field(&mut multipart).await?;

    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let service = state.service.clone();

    let result = tokio::task::spawn_blocking(move || span.in_scope(|| service.predict(clip)))
        .await
        .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(Json(result))
}

/// POST /predict-stream
///
/// Same contract as `/predict`, one independent classification per chunk.
pub async fn predict_stream(
    state: State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResult>> {
    predict(state, multipart).await
}

/// First `audio` part of the form
async fn read_audio_field(multipart: &mut Multipart) -> ApiResult<AudioClip> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let hint = AudioHint::new(field.file_name(), field.content_type());
        let data = field.bytes().await.map_err(multipart_error)?;
        debug!(
            "Received audio part: {} bytes (ext={:?}, mime={:?})",
            data.len(),
            hint.extension,
            hint.mime_type
        );

        return Ok(AudioClip::new(data, hint));
    }

    Err(ApiError::unprocessable(format!(
        "Missing multipart field '{}'",
        AUDIO_FIELD
    )))
}

fn multipart_error(e: MultipartError) -> ApiError {
    rejected(e.status(), e.body_text())
}

/// Oversized bodies keep 413, every other form problem is 422
fn rejected(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Rejected(status, message)
    } else {
        ApiError::unprocessable(message)
    }
}

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict-stream", post(predict_stream))
}
