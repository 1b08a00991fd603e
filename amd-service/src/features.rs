//! Waveform to model input
//!
//! Every model input has exactly `max_length` samples. Shorter clips are
//! right-padded with zeros and the padding is marked invalid in the mask;
//! longer clips are truncated.

use crate::audio::Waveform;
use amd_common::config::ModelConfig;

/// Variance floor used by wav2vec2-style normalisation
const NORM_EPSILON: f32 = 1e-7;

/// Fixed-length classifier input
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub values: Vec<f32>,
    /// `true` for real samples, `false` for padding
    pub mask: Vec<bool>,
    /// Number of real samples at the start of `values`
    pub valid_len: usize,
}

impl ModelInput {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The real (unpadded) samples
    pub fn valid(&self) -> &[f32] {
        &self.values[..self.valid_len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureExtractor {
    max_length: usize,
    normalize: bool,
}

impl FeatureExtractor {
    /// `max_length` of zero is rejected by config validation before this is built.
    pub fn new(max_length: usize, normalize: bool) -> Self {
        Self {
            max_length,
            normalize,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.max_length, config.normalize)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn extract(&self, waveform: &Waveform) -> ModelInput {
        let valid_len = waveform.samples.len().min(self.max_length);
        let mut values = Vec::with_capacity(self.max_length);
        values.extend_from_slice(&waveform.samples[..valid_len]);

        if self.normalize {
            normalize_in_place(&mut values);
        }
        values.resize(self.max_length, 0.0);

        let mut mask = vec![false; self.max_length];
        mask[..valid_len].fill(true);

        ModelInput {
            values,
            mask,
            valid_len,
        }
    }
}

/// Zero mean, unit variance. Silence stays silence.
fn normalize_in_place(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| {
            let d = s as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let scale = 1.0 / (var + NORM_EPSILON as f64).sqrt();

    for s in samples.iter_mut() {
        *s = ((*s as f64 - mean) * scale) as f32;
    }
}
