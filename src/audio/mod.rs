pub mod buffer;
pub mod recording;

pub use buffer::IngestBuffer;
pub use recording::write_call_recording;

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Sample rate every caller-side encoder targets (16kHz mono PCM).
pub const SAMPLE_RATE: u32 = 16_000;

/// One ordered slice of caller audio as received from the transport.
#[derive(Debug, Clone)]
pub struct AudioFragment {
    /// Monotonic per-call sequence number, starting at 0
    pub sequence: u64,
    /// Raw 16-bit little-endian PCM bytes
    pub pcm: Vec<u8>,
    /// When the fragment arrived at the server
    pub received_at: DateTime<Utc>,
    /// Client-reported input level, clamped to [0, 1]
    pub input_level: f32,
}

impl AudioFragment {
    pub fn new(sequence: u64, pcm: Vec<u8>, input_level: f32) -> Self {
        Self {
            sequence,
            pcm,
            received_at: Utc::now(),
            input_level: input_level.clamp(0.0, 1.0),
        }
    }
}

/// Immutable view of all audio accepted for a call up to one point.
///
/// A new snapshot supersedes, never mutates, a prior one; the version is
/// the counter stamped onto every stage result computed from it.
#[derive(Debug, Clone)]
pub struct AudioSnapshot {
    pub version: u64,
    pub pcm: Arc<Vec<u8>>,
    pub duration_ms: u64,
}

impl AudioSnapshot {
    /// An empty snapshot, used before any audio has been accepted.
    pub fn empty() -> Self {
        Self {
            version: 0,
            pcm: Arc::new(Vec::new()),
            duration_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Normalize 16-bit PCM to full scale.
///
/// Applied before transcription when the caller asked for noise
/// filtering; quiet phone audio otherwise tends to fall below the
/// decoder's useful range.
pub fn normalize_pcm(pcm: &[u8]) -> Vec<u8> {
    let samples: Vec<i16> = pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    let peak = samples.iter().map(|s| (*s as i32).abs()).max().unwrap_or(0);
    if peak == 0 {
        return pcm.to_vec();
    }

    let gain = i16::MAX as f64 / peak as f64;
    samples
        .iter()
        .flat_map(|&s| {
            let scaled = (s as f64 * gain)
                .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            scaled.to_le_bytes()
        })
        .collect()
}
