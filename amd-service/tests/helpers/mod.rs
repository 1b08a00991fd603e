//! Test Helper Utilities
//!
//! Shared utilities for testing amd-service

#![allow(dead_code)]

pub mod audio_generator;
pub mod multipart;

pub use audio_generator::{silent_wav, tone_wav, WavConfig};
pub use multipart::{multipart_body, MultipartPart, BOUNDARY};

use amd_common::config::ModelConfig;
use amd_service::engine::probe::{DenseLayer, ProbeWeights};
use amd_service::engine::{load_engine, Device, EngineState};
use amd_service::fallback::FallbackSimulator;
use amd_service::features::FeatureExtractor;
use amd_service::service::PredictionService;
use amd_service::{build_router, AppState};
use axum::Router;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Upload limit used by test routers
pub const TEST_UPLOAD_LIMIT: usize = 2 * 1024 * 1024;

/// Probe that favours "human" for clips with level variation and
/// "voicemail" for steady or silent clips
pub fn probe_weights() -> ProbeWeights {
    ProbeWeights {
        frame_size: 400,
        hop_size: 160,
        feature_mean: vec![-12.0, 2.0, 0.1, 0.05, 0.4, 0.5],
        feature_std: vec![6.0, 2.0, 0.1, 0.05, 0.3, 0.5],
        layers: vec![
            DenseLayer {
                weights: vec![
                    vec![0.3, 0.6, 0.0, 0.2, 0.8, 0.7],
                    vec![0.0, -0.4, 0.0, 0.0, -0.6, -0.5],
                    vec![0.1, 0.0, 0.5, 0.0, 0.0, 0.0],
                ],
                bias: vec![0.1, 0.2, 0.0],
            },
            DenseLayer {
                weights: vec![vec![-0.5, 1.0, 0.1], vec![1.0, -0.5, 0.2]],
                bias: vec![0.05, 0.0],
            },
        ],
    }
}

/// Write probe weights to a temp file (keep the handle alive)
pub fn probe_model_file() -> (NamedTempFile, PathBuf) {
    let mut file = NamedTempFile::new().unwrap();
    let json = serde_json::to_string_pretty(&probe_weights()).unwrap();
    file.write_all(json.as_bytes()).unwrap();
    let path = file.path().to_path_buf();
    (file, path)
}

/// Service with a loaded probe engine
pub fn ready_service() -> PredictionService {
    let (_file, path) = probe_model_file();
    let config = ModelConfig {
        path: Some(path),
        max_length: 32_000,
        ..ModelConfig::default()
    };
    let engine = load_engine(&config, Device::Cpu).unwrap();
    assert!(engine.is_ready(), "probe engine should load: {:?}", engine);

    PredictionService::new(
        engine,
        FeatureExtractor::from_config(&config),
        FallbackSimulator::new(Some(11)),
        Device::Cpu,
    )
}

/// Service whose engine failed to load
pub fn fallback_service(seed: u64) -> PredictionService {
    let engine = load_engine(&ModelConfig::default(), Device::Cpu).unwrap();
    assert!(matches!(engine, EngineState::LoadFailed(_)));

    PredictionService::new(
        engine,
        FeatureExtractor::new(32_000, true),
        FallbackSimulator::new(Some(seed)),
        Device::Cpu,
    )
}

pub fn ready_app() -> Router {
    build_router(AppState::new(ready_service()), TEST_UPLOAD_LIMIT)
}

pub fn fallback_app(seed: u64) -> Router {
    build_router(AppState::new(fallback_service(seed)), TEST_UPLOAD_LIMIT)
}
