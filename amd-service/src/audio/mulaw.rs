//! Headerless G.711 mu-law payloads
//!
//! Telephony media streams deliver bare mu-law bytes at 8 kHz. Those bytes
//! carry no container, so they are wrapped in a WAVE header (format tag 7)
//! and handed to the regular codec layer. Only parts explicitly labelled with
//! a mu-law MIME type take this path.

use super::AudioHint;

/// Sample rate assumed when the MIME type carries no `rate` parameter
pub const DEFAULT_MULAW_RATE: u32 = 8000;

const WAVE_FORMAT_MULAW: u16 = 0x0007;

const MULAW_MIME_TYPES: [&str; 4] = ["audio/basic", "audio/x-mulaw", "audio/mulaw", "audio/pcmu"];

/// Sample rate of a raw mu-law part, or `None` when the part is not raw mu-law
pub fn raw_mulaw_rate(hint: &AudioHint) -> Option<u32> {
    let essence = hint.mime_essence()?;
    if !MULAW_MIME_TYPES.contains(&essence.as_str()) {
        return None;
    }

    let rate = hint
        .mime_type
        .as_deref()
        .into_iter()
        .flat_map(|m| m.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|rate| *rate > 0)
        .unwrap_or(DEFAULT_MULAW_RATE);

    Some(rate)
}

/// Wrap mono mu-law bytes in a minimal WAVE container
pub fn wrap_in_wav(payload: &[u8], sample_rate: u32) -> Vec<u8> {
    const FMT_LEN: u32 = 18;
    let data_len = payload.len() as u32;
    let pad = (payload.len() % 2) as u32;
    let riff_len = 4 + (8 + FMT_LEN) + (8 + data_len + pad);

    let mut wav = Vec::with_capacity(riff_len as usize + 8);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_len.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_LEN.to_le_bytes());
    wav.extend_from_slice(&WAVE_FORMAT_MULAW.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // channels
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes()); // byte rate, 1 byte per sample
    wav.extend_from_slice(&1u16.to_le_bytes()); // block align
    wav.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(&0u16.to_le_bytes()); // extension size

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(payload);
    if pad == 1 {
        wav.push(0);
    }

    wav
}
