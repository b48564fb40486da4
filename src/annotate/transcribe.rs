use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Transcriber, Transcription};
use crate::audio::AudioSnapshot;
use crate::session::CallSettings;

/// Development stand-in for a real speech-to-text backend.
///
/// Rotates through canned emergency utterances so the rest of the chain
/// can be exercised without a model. A production deployment replaces
/// this with a backend that actually decodes the snapshot PCM.
pub struct CannedTranscriber {
    lines: Vec<&'static str>,
    next: AtomicUsize,
}

impl CannedTranscriber {
    pub fn new() -> Self {
        Self {
            lines: vec![
                "Help! My wife is unconscious and not breathing. She collapsed suddenly.",
                "There's a fire at my house! Smoke is everywhere, flames coming from the kitchen.",
                "Someone is breaking into my house! I hear glass breaking and footsteps.",
                "Car accident on Highway 101 near Exit 15. Multiple cars involved, people injured.",
                "Tornado warning! Severe weather approaching downtown. Taking shelter in basement.",
            ],
            next: AtomicUsize::new(0),
        }
    }
}

impl Default for CannedTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for CannedTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioSnapshot,
        _settings: &CallSettings,
    ) -> Result<Transcription> {
        if audio.is_empty() {
            bail!("no audio to transcribe");
        }

        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.lines.len();
        Ok(Transcription {
            text: self.lines[idx].to_string(),
            confidence: 0.9,
        })
    }
}
