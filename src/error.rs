use thiserror::Error;

/// Session and ingest errors surfaced to transport callers.
///
/// Stage-level failures (annotation timeouts, unavailable services) are
/// absorbed inside the pipeline and never appear here; they degrade the
/// affected stage to a zero-confidence sentinel instead.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("call {0} already has a live session")]
    DuplicateCall(String),

    #[error("no open session for call {0}")]
    UnknownCall(String),

    #[error("session limit reached ({limit} concurrent calls)")]
    CapacityExceeded { limit: usize },

    #[error("fragment out of order: expected sequence {expected}, got {got}")]
    OutOfOrderFragment { expected: u64, got: u64 },

    #[error("audio budget exceeded after {fragments} fragments")]
    TooLargeAudio { fragments: u64 },

    #[error("audio stream already closed")]
    StreamClosed,
}

impl TriageError {
    /// Stable machine-readable code for wire error frames.
    pub fn code(&self) -> &'static str {
        match self {
            TriageError::DuplicateCall(_) => "duplicate_call",
            TriageError::UnknownCall(_) => "unknown_call",
            TriageError::CapacityExceeded { .. } => "capacity_exceeded",
            TriageError::OutOfOrderFragment { .. } => "out_of_order_fragment",
            TriageError::TooLargeAudio { .. } => "too_large_audio",
            TriageError::StreamClosed => "stream_closed",
        }
    }
}
