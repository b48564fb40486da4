use std::sync::Arc;

use crate::audio::{AudioFragment, AudioSnapshot};
use crate::error::TriageError;

/// Accumulates ordered audio fragments for one call.
///
/// Sequencing is strict: the buffer accepts exactly `last_accepted + 1`
/// and rejects gaps and duplicates rather than reordering. Every accepted
/// fragment bumps the snapshot version counter, which is the version
/// stamped onto any stage result computed afterward.
pub struct IngestBuffer {
    pcm: Vec<u8>,
    next_sequence: u64,
    version: u64,
    fragments_accepted: u64,
    fragment_budget: u64,
    nominal_fragment_ms: u64,
    last_input_level: f32,
    closed: bool,
}

impl IngestBuffer {
    /// `fragment_budget` is the maximum fragment count, derived from the
    /// configured maximum call duration and the nominal fragment length.
    pub fn new(fragment_budget: u64, nominal_fragment_ms: u64) -> Self {
        Self {
            pcm: Vec::new(),
            next_sequence: 0,
            version: 0,
            fragments_accepted: 0,
            fragment_budget,
            nominal_fragment_ms,
            last_input_level: 0.0,
            closed: false,
        }
    }

    /// Accept the next fragment and return the new snapshot version.
    pub fn accept(&mut self, fragment: AudioFragment) -> Result<u64, TriageError> {
        if self.closed {
            return Err(TriageError::StreamClosed);
        }

        if fragment.sequence != self.next_sequence {
            return Err(TriageError::OutOfOrderFragment {
                expected: self.next_sequence,
                got: fragment.sequence,
            });
        }

        if self.fragments_accepted >= self.fragment_budget {
            return Err(TriageError::TooLargeAudio {
                fragments: self.fragments_accepted,
            });
        }

        self.pcm.extend_from_slice(&fragment.pcm);
        self.next_sequence += 1;
        self.fragments_accepted += 1;
        self.version += 1;
        self.last_input_level = fragment.input_level;

        Ok(self.version)
    }

    /// Take an immutable snapshot of everything accepted so far.
    pub fn snapshot(&self) -> AudioSnapshot {
        AudioSnapshot {
            version: self.version,
            pcm: Arc::new(self.pcm.clone()),
            duration_ms: self.fragments_accepted * self.nominal_fragment_ms,
        }
    }

    /// Current snapshot version (0 before any audio).
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_input_level(&self) -> f32 {
        self.last_input_level
    }

    /// Stop accepting fragments. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Drain the accumulated PCM for the finalized-call recording.
    pub fn take_pcm(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pcm)
    }
}
