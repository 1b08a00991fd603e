//! Two-class classification engines
//!
//! Class index 0 is voicemail, index 1 is human. Every backend returns raw
//! scores in that order and shares the softmax in [`Classifier::infer`].

pub mod probe;
pub mod state;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use probe::ProbeClassifier;
pub use state::{EnginePhase, EngineState, InvalidTransition};

use crate::error::{EngineLoadError, InferenceError};
use crate::features::ModelInput;
use amd_common::config::{Backend, DevicePreference, ModelConfig};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Class index of the voicemail score
pub const VOICEMAIL_INDEX: usize = 0;
/// Class index of the human score
pub const HUMAN_INDEX: usize = 1;

/// Softmax output over the two classes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub voicemail: f64,
    pub human: f64,
}

impl ClassProbabilities {
    /// Numerically stable softmax over `[voicemail, human]` scores
    pub fn from_logits(logits: [f32; 2]) -> Result<Self, InferenceError> {
        let [v, h] = logits;
        if !v.is_finite() || !h.is_finite() {
            return Err(InferenceError::NonFinite(v, h));
        }

        let (v, h) = (v as f64, h as f64);
        let max = v.max(h);
        let ev = (v - max).exp();
        let eh = (h - max).exp();
        let sum = ev + eh;

        Ok(Self {
            voicemail: ev / sum,
            human: eh / sum,
        })
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.voicemail, self.human]
    }
}

/// Compute device reported by the health route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// Pick the device once at startup.
///
/// CUDA is only possible for the ONNX backend built with the `cuda` feature.
pub fn select_device(preference: DevicePreference, backend: Backend) -> Device {
    if preference == DevicePreference::Cpu {
        return Device::Cpu;
    }

    let available = backend == Backend::Onnx && cuda_available();
    if available {
        return Device::Cuda;
    }

    if preference == DevicePreference::Cuda {
        warn!("CUDA requested but not available for the {} backend, using cpu", backend);
    }
    Device::Cpu
}

#[cfg(feature = "cuda")]
fn cuda_available() -> bool {
    onnx::cuda_available()
}

#[cfg(not(feature = "cuda"))]
fn cuda_available() -> bool {
    false
}

/// A loaded model
///
/// Implementations hold immutable parameters; `forward` must not change any
/// observable state so that concurrent requests are independent.
pub trait Classifier: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Raw `[voicemail, human]` scores
    fn forward(&self, input: &ModelInput) -> Result<[f32; 2], InferenceError>;

    fn infer(&self, input: &ModelInput) -> Result<ClassProbabilities, InferenceError> {
        if input.is_empty() {
            return Err(InferenceError::EmptyInput);
        }
        ClassProbabilities::from_logits(self.forward(input)?)
    }
}

/// Drive the engine state machine through one load attempt.
///
/// A load failure is not an error here: it ends in `LoadFailed`.
pub fn load_engine(config: &ModelConfig, device: Device) -> Result<EngineState, InvalidTransition> {
    let loading = EngineState::default().begin_loading()?;
    info!(
        "Engine {} -> {} (backend={}, device={})",
        EnginePhase::Unloaded,
        loading.phase(),
        config.backend,
        device
    );

    let outcome = open_classifier(config, device);
    let state = loading.complete(outcome)?;

    match &state {
        EngineState::LoadFailed(reason) => {
            warn!(
                "Engine {} -> {}: {}. Predictions will be simulated",
                EnginePhase::Loading,
                state.phase(),
                reason
            );
        }
        _ => info!("Engine {} -> {}", EnginePhase::Loading, state.phase()),
    }

    Ok(state)
}

/// Build the configured backend
pub fn open_classifier(
    config: &ModelConfig,
    device: Device,
) -> Result<Arc<dyn Classifier>, EngineLoadError> {
    let path = config.path.as_deref().ok_or(EngineLoadError::NotConfigured)?;

    match config.backend {
        Backend::Probe => Ok(Arc::new(ProbeClassifier::load(path)?)),
        Backend::Onnx => open_onnx(path, config, device),
    }
}

#[cfg(feature = "onnx")]
fn open_onnx(
    path: &Path,
    config: &ModelConfig,
    device: Device,
) -> Result<Arc<dyn Classifier>, EngineLoadError> {
    let classifier = onnx::OnnxClassifier::load(path, device, config.use_attention_mask)?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn open_onnx(
    _path: &Path,
    _config: &ModelConfig,
    _device: Device,
) -> Result<Arc<dyn Classifier>, EngineLoadError> {
    Err(EngineLoadError::BackendUnavailable(
        "onnx backend requires building amd-service with the `onnx` feature".to_string(),
    ))
}
