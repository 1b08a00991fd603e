//! amd-service - answering-machine detection over HTTP
//!
//! Classifies a short telephony clip as live human speech or a voicemail
//! greeting. Pipeline: decode (symphonia) -> resample to 16 kHz mono (rubato)
//! -> fixed-length model input -> two-class engine -> decision.
//!
//! When no model could be loaded the service stays up and answers with
//! simulated results flagged `simulated: true`.

pub mod api;
pub mod audio;
pub mod cli;
pub mod decision;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod features;
pub mod service;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::PredictionService;

/// Build identification captured by build.rs
pub const GIT_HASH: &str = env!("GIT_HASH");
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Routes, CORS (any origin) and the upload size limit
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::predict_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
