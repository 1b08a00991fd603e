//! Audio decoder using symphonia
//!
//! Decodes an in-memory clip of any supported container/codec (WAV incl.
//! G.711 mu-law/A-law, MP3, FLAC, Ogg/Vorbis, AAC/MP4, ...) into the 16 kHz
//! mono [`Waveform`] the classifier expects.

use super::mulaw;
use super::resampler::{check_source_rate, downmix_to_mono, source_frame_limit, Resampler};
use super::{AudioHint, Waveform};
use crate::error::DecodeError;
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Interleaved PCM straight out of the codec layer
struct DecodedPcm {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

/// Stateless decoder from uploaded bytes to [`Waveform`]
pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode a clip and normalize it to 16 kHz mono.
    ///
    /// Only as much of the source as yields `max_length` output samples is
    /// decoded; the rest of the clip is dropped.
    ///
    /// # Errors
    /// - [`DecodeError::Empty`] for a zero-length payload
    /// - [`DecodeError::Unsupported`] when no container format matches or the
    ///   source sample rate is outside the accepted range
    /// - [`DecodeError::NoSamples`] when the stream decodes to nothing
    pub fn decode(
        data: Bytes,
        hint: &AudioHint,
        max_length: usize,
    ) -> Result<Waveform, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let pcm = match mulaw::raw_mulaw_rate(hint) {
            Some(rate) => {
                check_source_rate(rate)?;
                // one byte per frame
                let kept = data.len().min(source_frame_limit(max_length, rate));
                debug!("Wrapping {} of {} raw mu-law bytes at {}Hz", kept, data.len(), rate);
                let wav = mulaw::wrap_in_wav(&data[..kept], rate);
                Self::decode_pcm(Box::new(Cursor::new(wav)), &Hint::new(), max_length)?
            }
            None => Self::decode_pcm(
                Box::new(Cursor::new(data)),
                &Self::probe_hint(hint),
                max_length,
            )?,
        };

        if pcm.channels == 0 || pcm.samples.is_empty() {
            return Err(DecodeError::NoSamples);
        }

        let mono = downmix_to_mono(&pcm.samples, pcm.channels);
        let mut samples = Resampler::resample(&mono, pcm.sample_rate)?;
        // a handful of frames at a high rate can resample to nothing
        if samples.is_empty() {
            return Err(DecodeError::NoSamples);
        }
        for sample in samples.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        debug!(
            "Decoded {} samples at {}Hz x{} into {} mono samples",
            pcm.samples.len(),
            pcm.sample_rate,
            pcm.channels,
            samples.len()
        );

        Ok(Waveform {
            samples,
            source_sample_rate: pcm.sample_rate,
            source_channels: pcm.channels,
        })
    }

    fn probe_hint(hint: &AudioHint) -> Hint {
        let mut probe_hint = Hint::new();
        if let Some(ext) = hint.extension.as_deref() {
            probe_hint.with_extension(ext);
        }
        if let Some(mime) = hint.mime_essence() {
            probe_hint.mime_type(&mime);
        }
        probe_hint
    }

    /// Probe the container and decode the first audio track to interleaved f32,
    /// stopping once enough frames for `max_length` output samples are in hand
    fn decode_pcm(
        source: Box<dyn MediaSource>,
        hint: &Hint,
        max_length: usize,
    ) -> Result<DecodedPcm, DecodeError> {
        let mss = MediaSourceStream::new(source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::MissingSampleRate)?;
        check_source_rate(sample_rate)?;
        let frame_limit = source_frame_limit(max_length, sample_rate);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Codec(format!("Failed to create decoder: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut channels = 0usize;
        let mut sample_buf: Option<SampleBuffer<f32>> = None;
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(DecodeError::Codec(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error (skipping packet): {}", e);
                    skipped_packets += 1;
                    continue;
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(DecodeError::Codec(e.to_string())),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count();
            let needed = decoded.capacity() * channels;

            if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }

            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }

            if channels > 0 && samples.len() / channels >= frame_limit {
                samples.truncate(frame_limit.saturating_mul(channels));
                debug!("Stopped decoding at {} frames", frame_limit);
                break;
            }
        }

        if skipped_packets > 0 {
            warn!("Skipped {} undecodable packets", skipped_packets);
        }

        Ok(DecodedPcm {
            samples,
            sample_rate,
            channels,
        })
    }
}
