use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Caller-supplied per-call settings, taken from the first config frame
/// and updatable by later config frames without resetting the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallSettings {
    /// Language hint forwarded to the transcription service
    pub language: Option<String>,

    /// Normalize audio before transcription
    #[serde(default)]
    pub noise_filtering: bool,
}

/// Process-level knobs the session manager applies to every call,
/// derived from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct SessionLimits {
    /// Maximum concurrently open sessions
    pub max_concurrent_calls: usize,

    /// Maximum accepted fragments per call
    pub fragment_budget: u64,

    /// Nominal duration of one fragment (drives the duration estimate)
    pub nominal_fragment_ms: u64,

    /// Per-stage annotation budget
    pub stage_timeout: Duration,

    /// Where finalized call audio is written; `None` disables recording
    pub recordings_dir: Option<PathBuf>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 64,
            fragment_budget: 2400, // 600s of 250ms fragments
            nominal_fragment_ms: 250,
            stage_timeout: Duration::from_millis(300),
            recordings_dir: None,
        }
    }
}

impl From<&crate::config::Config> for SessionLimits {
    fn from(cfg: &crate::config::Config) -> Self {
        let nominal_ms = cfg.calls.nominal_fragment_ms.max(1);
        Self {
            max_concurrent_calls: cfg.calls.max_concurrent,
            fragment_budget: cfg.calls.max_call_secs * 1000 / nominal_ms,
            nominal_fragment_ms: nominal_ms,
            stage_timeout: Duration::from_millis(cfg.pipeline.stage_timeout_ms),
            recordings_dir: Some(PathBuf::from(&cfg.storage.recordings_dir)),
        }
    }
}
