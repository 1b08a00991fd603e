//! Audio Test Fixture Generator
//!
//! In-memory WAV clips built with hound

use std::io::Cursor;

#[derive(Debug, Clone)]
pub struct WavConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 8000,
            channels: 1,
        }
    }
}

/// Encode frames produced by `sample_at(frame_index)` as 16-bit PCM WAV
pub fn generate_wav(config: &WavConfig, sample_at: impl Fn(usize) -> f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = (config.duration_seconds * config.sample_rate as f64) as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let value = (sample_at(i).clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            for _ in 0..config.channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn silent_wav(config: &WavConfig) -> Vec<u8> {
    generate_wav(config, |_| 0.0)
}

/// Sine tone that switches on and off every 250 ms, like speech bursts
pub fn tone_wav(config: &WavConfig, frequency: f32) -> Vec<u8> {
    let rate = config.sample_rate as f32;
    let burst = (config.sample_rate / 4).max(1) as usize;
    generate_wav(config, move |i| {
        if (i / burst) % 2 == 0 {
            (2.0 * std::f32::consts::PI * frequency * i as f32 / rate).sin() * 0.5
        } else {
            0.0
        }
    })
}
