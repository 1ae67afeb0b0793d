//! 16-bit little-endian PCM helpers for narration playback and live voice.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decoded, de-interleaved audio ready to copy into an `AudioBuffer`.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedPcm {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl DecodedPcm {
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

pub fn decode_base64_pcm(data: &str, sample_rate: u32, num_channels: usize) -> Result<DecodedPcm> {
    let bytes = STANDARD.decode(data.trim())?;
    decode_pcm16(&bytes, sample_rate, num_channels)
}

pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, num_channels: usize) -> Result<DecodedPcm> {
    if num_channels == 0 {
        return Err(Error::Decode("channel count must be positive".into()));
    }
    if bytes.len() % 2 != 0 {
        return Err(Error::Decode(format!("odd PCM16 byte length {}", bytes.len())));
    }
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    let frames = samples.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(frames); num_channels];
    for frame in samples.chunks_exact(num_channels) {
        for (ch, s) in frame.iter().enumerate() {
            channels[ch].push(*s as f32 / 32768.0);
        }
    }
    Ok(DecodedPcm {
        sample_rate,
        channels,
    })
}

#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&f32_to_i16(s).to_le_bytes());
    }
    out
}

/// Microphone frames for the live session: mono f32 -> base64 PCM16.
pub fn encode_base64_pcm(samples: &[f32]) -> String {
    STANDARD.encode(encode_pcm16(samples))
}

/// MIME type announced alongside PCM chunks.
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}
