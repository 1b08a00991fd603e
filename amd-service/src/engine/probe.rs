//! Built-in probe classifier
//!
//! A small dense network over six statistics pooled from short frames of the
//! waveform. Parameters are loaded from a JSON model file:
//!
//! ```json
//! {
//!   "frame_size": 400,
//!   "hop_size": 160,
//!   "feature_mean": [0, 0, 0, 0, 0, 0],
//!   "feature_std": [1, 1, 1, 1, 1, 1],
//!   "layers": [
//!     { "weights": [[...6 values...], ...], "bias": [...] },
//!     { "weights": [[...], [...]], "bias": [0.0, 0.0] }
//!   ]
//! }
//! ```
//!
//! `weights` is row-major `[out][in]`. Hidden layers use ReLU; the last layer
//! is linear with two outputs (voicemail, human).

use super::Classifier;
use crate::error::{EngineLoadError, InferenceError};
use crate::features::ModelInput;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Length of the pooled feature vector
pub const FEATURE_DIM: usize = 6;

const ENERGY_FLOOR: f64 = 1e-10;

/// Rounding slack when comparing a frame's energy to the clip mean
const ACTIVE_MARGIN: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    fn output_dim(&self) -> usize {
        self.bias.len()
    }

    fn apply(&self, input: &[f32], relu: bool) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b;
                if relu {
                    z.max(0.0)
                } else {
                    z
                }
            })
            .collect()
    }
}

/// On-disk model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeWeights {
    pub frame_size: usize,
    pub hop_size: usize,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
    pub layers: Vec<DenseLayer>,
}

impl ProbeWeights {
    fn validate(&self) -> Result<(), EngineLoadError> {
        let invalid = |msg: String| Err(EngineLoadError::Invalid(msg));

        if self.frame_size == 0 || self.hop_size == 0 {
            return invalid("frame_size and hop_size must be positive".to_string());
        }
        if self.feature_mean.len() != FEATURE_DIM || self.feature_std.len() != FEATURE_DIM {
            return invalid(format!(
                "feature_mean/feature_std must have {} entries",
                FEATURE_DIM
            ));
        }
        if self.feature_mean.iter().any(|v| !v.is_finite()) {
            return invalid("feature_mean contains non-finite values".to_string());
        }
        if self.feature_std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return invalid("feature_std must be finite and positive".to_string());
        }
        if self.layers.is_empty() {
            return invalid("at least one layer is required".to_string());
        }

        let mut width = FEATURE_DIM;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() {
                return invalid(format!(
                    "layer {}: {} weight rows but {} biases",
                    i,
                    layer.weights.len(),
                    layer.bias.len()
                ));
            }
            if layer.weights.iter().any(|row| row.len() != width) {
                return invalid(format!("layer {}: expected input width {}", i, width));
            }
            let finite = layer
                .weights
                .iter()
                .flatten()
                .chain(&layer.bias)
                .all(|v| v.is_finite());
            if !finite {
                return invalid(format!("layer {}: non-finite parameter", i));
            }
            width = layer.output_dim();
        }

        if width != 2 {
            return invalid(format!("final layer must have 2 outputs, has {}", width));
        }
        Ok(())
    }
}

/// Dense probe over pooled frame statistics
#[derive(Debug, Clone)]
pub struct ProbeClassifier {
    weights: ProbeWeights,
}

impl ProbeClassifier {
    /// Load and validate a JSON model file
    pub fn load(path: &Path) -> Result<Self, EngineLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let weights: ProbeWeights = serde_json::from_str(&content)
            .map_err(|e| EngineLoadError::Invalid(format!("{}: {}", path.display(), e)))?;

        let classifier = Self::new(weights)?;
        info!(
            "Loaded probe model from {} ({} layers, frame={} hop={})",
            path.display(),
            classifier.weights.layers.len(),
            classifier.weights.frame_size,
            classifier.weights.hop_size
        );
        Ok(classifier)
    }

    pub fn new(weights: ProbeWeights) -> Result<Self, EngineLoadError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ProbeWeights {
        &self.weights
    }
}

impl Classifier for ProbeClassifier {
    fn name(&self) -> &str {
        "probe"
    }

    fn forward(&self, input: &ModelInput) -> Result<[f32; 2], InferenceError> {
        let signal = input.valid();
        if signal.is_empty() {
            return Err(InferenceError::EmptyInput);
        }

        let stats = frame_statistics(signal, self.weights.frame_size, self.weights.hop_size);
        let mut hidden: Vec<f32> = stats
            .iter()
            .zip(&self.weights.feature_mean)
            .zip(&self.weights.feature_std)
            .map(|((x, mean), std)| (x - mean) / std)
            .collect();

        let last = self.weights.layers.len() - 1;
        for (i, layer) in self.weights.layers.iter().enumerate() {
            hidden = layer.apply(&hidden, i != last);
        }

        match hidden.as_slice() {
            [voicemail, human] => Ok([*voicemail, *human]),
            other => Err(InferenceError::Shape(format!(
                "expected 2 scores, got {}",
                other.len()
            ))),
        }
    }
}

/// Pooled frame statistics:
///
/// 0. mean log energy
/// 1. std of log energy
/// 2. mean zero-crossing rate
/// 3. std of zero-crossing rate
/// 4. active ratio (frames louder than the mean log energy)
/// 5. mean absolute frame-to-frame log-energy change
pub fn frame_statistics(signal: &[f32], frame_size: usize, hop_size: usize) -> [f32; FEATURE_DIM] {
    let frames: Vec<&[f32]> = if signal.len() <= frame_size {
        vec![signal]
    } else {
        (0..=(signal.len() - frame_size))
            .step_by(hop_size.max(1))
            .map(|start| &signal[start..start + frame_size])
            .collect()
    };

    let energies: Vec<f64> = frames.iter().map(|f| log_energy(f)).collect();
    let zcrs: Vec<f64> = frames.iter().map(|f| zero_crossing_rate(f)).collect();

    let (energy_mean, energy_std) = mean_std(&energies);
    let (zcr_mean, zcr_std) = mean_std(&zcrs);

    let loud = energies
        .iter()
        .filter(|&&e| e > energy_mean + ACTIVE_MARGIN)
        .count();
    let active = loud as f64 / energies.len() as f64;
    let flux = if energies.len() > 1 {
        energies.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (energies.len() - 1) as f64
    } else {
        0.0
    };

    [
        energy_mean as f32,
        energy_std as f32,
        zcr_mean as f32,
        zcr_std as f32,
        active as f32,
        flux as f32,
    ]
}

fn log_energy(frame: &[f32]) -> f64 {
    let power =
        frame.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / frame.len().max(1) as f64;
    (power + ENERGY_FLOOR).ln()
}

fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
