//! WAV container wrapping for raw speech PCM.
//!
//! Speech providers return raw 16-bit little-endian PCM tagged with an
//! `audio/L16;...;rate=NNNN` mime hint. Browsers cannot play that, so the
//! pipeline wraps it into a minimal RIFF/WAVE container before upload.
//! Anything that is not L16 PCM passes through untouched.

use super::PostProcessor;
use async_trait::async_trait;

pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

pub struct WavEncoder;

#[async_trait]
impl PostProcessor for WavEncoder {
    async fn process(&self, bytes: Vec<u8>, mime: &str) -> (Vec<u8>, String) {
        if !mime.starts_with("audio/L16") {
            return (bytes, mime.to_string());
        }
        let rate = parse_sample_rate(mime).unwrap_or(DEFAULT_SAMPLE_RATE);
        (wrap_pcm(&bytes, rate), "audio/wav".to_string())
    }
}

/// Extract the `rate=` parameter from an `audio/L16` mime hint.
pub fn parse_sample_rate(mime: &str) -> Option<u32> {
    mime.split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}

/// Prepend a 44-byte RIFF header to mono 16-bit PCM samples.
pub fn wrap_pcm(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = sample_rate * u32::from(CHANNELS) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
