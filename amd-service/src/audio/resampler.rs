//! Audio resampling using rubato
//!
//! The classifier consumes 16 kHz mono audio; telephony sources are usually
//! 8 kHz and file uploads anything from 8 to 48 kHz.

use crate::error::DecodeError;
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Sample rate of every waveform handed to feature extraction
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Lowest source rate accepted (below narrowband telephony)
pub const MIN_SOURCE_RATE: u32 = 4000;
/// Highest source rate accepted
pub const MAX_SOURCE_RATE: u32 = 384_000;

/// Extra source frames kept beyond what the model input needs, for filter delay
const FRAME_MARGIN: usize = 64;

/// Reject source rates outside [`MIN_SOURCE_RATE`, `MAX_SOURCE_RATE`]
pub fn check_source_rate(rate: u32) -> Result<(), DecodeError> {
    if (MIN_SOURCE_RATE..=MAX_SOURCE_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(DecodeError::Unsupported(format!(
            "sample rate {}Hz outside {}..={}Hz",
            rate, MIN_SOURCE_RATE, MAX_SOURCE_RATE
        )))
    }
}

/// Source frames needed to produce `max_length` output samples at 16 kHz
pub fn source_frame_limit(max_length: usize, source_rate: u32) -> usize {
    let needed = (max_length as u64 * source_rate as u64).div_ceil(TARGET_SAMPLE_RATE as u64);
    usize::try_from(needed)
        .unwrap_or(usize::MAX)
        .saturating_add(FRAME_MARGIN)
}

/// Mono resampler to [`TARGET_SAMPLE_RATE`]
pub struct Resampler;

impl Resampler {
    /// Resample a mono clip to 16 kHz in a single pass.
    ///
    /// Input already at the target rate is returned unchanged. Source rates
    /// outside the accepted range are rejected before any allocation.
    pub fn resample(input: &[f32], input_rate: u32) -> Result<Vec<f32>, DecodeError> {
        check_source_rate(input_rate)?;
        if input_rate == TARGET_SAMPLE_RATE {
            debug!("Sample rate already at {}Hz, skipping resample", TARGET_SAMPLE_RATE);
            return Ok(input.to_vec());
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Resampling {} frames from {}Hz to {}Hz",
            input.len(),
            input_rate,
            TARGET_SAMPLE_RATE
        );

        // The whole clip is one chunk: clips are short and this avoids tail handling
        let mut resampler = FastFixedIn::<f32>::new(
            TARGET_SAMPLE_RATE as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input.len(),
            1,
        )
        .map_err(|e| DecodeError::Resample(format!("Failed to create resampler: {}", e)))?;

        let mut output = resampler
            .process(&[input], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;

        let resampled = output.pop().unwrap_or_default();
        debug!("Resampled to {} frames", resampled.len());

        Ok(resampled)
    }
}

/// Average interleaved channels into one
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
