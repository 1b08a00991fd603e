//! Prediction orchestration
//!
//! Owns the engine state for the lifetime of the process. `predict` is
//! synchronous and CPU-bound; HTTP handlers call it from the blocking pool.

use crate::audio::{AudioDecoder, AudioHint};
use crate::decision::{decide, Decision, Label};
use crate::engine::{load_engine, select_device, Classifier, Device, EngineState};
use crate::error::PredictError;
use crate::fallback::FallbackSimulator;
use crate::features::FeatureExtractor;
use amd_common::config::TomlConfig;
use anyhow::Context;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One uploaded clip
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Bytes,
    pub hint: AudioHint,
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>, hint: AudioHint) -> Self {
        Self {
            data: data.into(),
            hint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence: f64,
    /// Seconds spent in the service, excluding transport
    pub processing_time: f64,
    /// True when the result came from the fallback simulator
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub device: String,
}

pub struct PredictionService {
    engine: EngineState,
    extractor: FeatureExtractor,
    fallback: FallbackSimulator,
    device: Device,
}

impl PredictionService {
    pub fn new(
        engine: EngineState,
        extractor: FeatureExtractor,
        fallback: FallbackSimulator,
        device: Device,
    ) -> Self {
        Self {
            engine,
            extractor,
            fallback,
            device,
        }
    }

    /// Select the device and load the configured engine once
    pub fn from_config(config: &TomlConfig) -> anyhow::Result<Self> {
        let device = select_device(config.model.device, config.model.backend);
        let engine = load_engine(&config.model, device).context("Failed to initialise engine")?;

        Ok(Self::new(
            engine,
            FeatureExtractor::from_config(&config.model),
            FallbackSimulator::new(config.fallback.seed),
            device,
        ))
    }

    pub fn engine(&self) -> &EngineState {
        &self.engine
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Classify one clip.
    ///
    /// Without a ready engine the clip is not inspected and a simulated result
    /// is returned. With a ready engine, decode and inference failures are
    /// returned as errors and never replaced by a simulated result.
    pub fn predict(&self, clip: AudioClip) -> Result<PredictionResult, PredictError> {
        let start = Instant::now();

        let Some(classifier) = self.engine.classifier() else {
            let Decision { label, confidence } = self.fallback.simulate();
            let processing_time = start.elapsed().as_secs_f64();
            warn!(
                "Model not loaded, returning simulated result: {} ({:.3}) in {:.3}s",
                label, confidence, processing_time
            );
            return Ok(PredictionResult {
                label,
                confidence,
                processing_time,
                simulated: true,
            });
        };

        let size = clip.data.len();
        match self.classify(classifier.as_ref(), clip) {
            Ok(Decision { label, confidence }) => {
                let processing_time = start.elapsed().as_secs_f64();
                info!(
                    "Prediction: {} ({:.3}) in {:.3}s",
                    label, confidence, processing_time
                );
                Ok(PredictionResult {
                    label,
                    confidence,
                    processing_time,
                    simulated: false,
                })
            }
            Err(e) => {
                error!("Prediction failed for {} byte clip: {}", size, e);
                Err(e)
            }
        }
    }

    fn classify(
        &self,
        classifier: &dyn Classifier,
        clip: AudioClip,
    ) -> Result<Decision, PredictError> {
        let waveform = AudioDecoder::decode(clip.data, &clip.hint, self.extractor.max_length())?;
        debug!(
            "Decoded {:.2}s of audio (source {}Hz x{})",
            waveform.duration_secs(),
            waveform.source_sample_rate,
            waveform.source_channels
        );

        let input = self.extractor.extract(&waveform);
        let probs = classifier.infer(&input)?;
        debug!(
            "{} probabilities: voicemail={:.4} human={:.4}",
            classifier.name(),
            probs.voicemail,
            probs.human
        );

        Ok(decide(probs))
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "running".to_string(),
            model_loaded: self.engine.is_ready(),
            device: self.device.to_string(),
        }
    }
}
