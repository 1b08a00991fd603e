//! Audio decoding to the classifier's waveform format
//!
//! Any container/codec symphonia understands is accepted. Output is always
//! mono at [`TARGET_SAMPLE_RATE`] with samples in [-1.0, 1.0].

pub mod decoder;
pub mod mulaw;
pub mod resampler;

pub use decoder::AudioDecoder;
pub use resampler::{Resampler, TARGET_SAMPLE_RATE};

/// Format hints carried alongside an uploaded clip
///
/// Both values come from the multipart part and are advisory: probing still
/// inspects the bytes themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioHint {
    /// File extension without the dot, lowercased (e.g. "wav")
    pub extension: Option<String>,
    /// MIME type as sent by the client (e.g. "audio/wav")
    pub mime_type: Option<String>,
}

impl AudioHint {
    /// Build hints from a part's file name and content type
    pub fn new(file_name: Option<&str>, mime_type: Option<&str>) -> Self {
        let extension = file_name
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        Self {
            extension,
            mime_type: mime_type.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        }
    }

    /// MIME type without parameters, lowercased
    pub fn mime_essence(&self) -> Option<String> {
        self.mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
    }
}

/// Decoded clip: mono, 16 kHz, normalized to [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    /// Sample rate of the source before resampling
    pub source_sample_rate: u32,
    /// Channel count of the source before downmixing
    pub source_channels: usize,
}

impl Waveform {
    /// Wrap samples that are already mono at the target rate
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples,
            source_sample_rate: TARGET_SAMPLE_RATE,
            source_channels: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds at the target rate
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / TARGET_SAMPLE_RATE as f64
    }
}
