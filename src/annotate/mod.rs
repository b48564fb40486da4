//! Annotation stage seams.
//!
//! Each stage is an opaque service behind an async trait: typed input in,
//! typed output plus confidence out. The pipeline owns timeouts and the
//! degraded-mode policy; implementations just succeed or fail.
//!
//! The default implementations are rule-based (keyword tables, token-scan
//! extraction) so the service annotates end-to-end with no external model
//! running. Real model backends slot in behind the same traits.

pub mod classify;
pub mod explain;
pub mod locate;
pub mod severity;
pub mod transcribe;

pub use classify::KeywordClassifier;
pub use explain::KeywordExplainer;
pub use locate::TokenScanLocator;
pub use severity::KeywordSeverityRater;
pub use transcribe::CannedTranscriber;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::audio::AudioSnapshot;
use crate::session::{CallSettings, EmergencyKind, SeverityLevel};

/// Transcription stage output.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub confidence: f32,
}

/// Classification stage output.
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub kind: EmergencyKind,
    pub confidence: f32,
}

/// Severity stage output.
#[derive(Debug, Clone, Copy)]
pub struct SeverityRating {
    pub level: SeverityLevel,
    pub confidence: f32,
}

/// Location stage output. `place` is the sentinel
/// [`crate::session::NO_LOCATION`] when nothing was found.
#[derive(Debug, Clone)]
pub struct LocatedPlace {
    pub place: String,
    pub confidence: f32,
}

/// Explanation stage output.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub text: String,
    pub confidence: f32,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &AudioSnapshot,
        settings: &CallSettings,
    ) -> Result<Transcription>;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, transcript: &str) -> Result<Classification>;
}

#[async_trait]
pub trait SeverityRater: Send + Sync {
    /// Severity keywords are category-specific, so the rater receives the
    /// classification result alongside the transcript.
    async fn rate(&self, transcript: &str, category: EmergencyKind) -> Result<SeverityRating>;
}

#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self, transcript: &str) -> Result<LocatedPlace>;
}

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(
        &self,
        transcript: &str,
        kind: EmergencyKind,
        severity: SeverityLevel,
    ) -> Result<Explanation>;
}

/// The full set of annotation services the pipeline runs against.
#[derive(Clone)]
pub struct AnnotatorSet {
    pub transcriber: Arc<dyn Transcriber>,
    pub classifier: Arc<dyn Classifier>,
    pub severity: Arc<dyn SeverityRater>,
    pub locator: Arc<dyn Locator>,
    pub explainer: Arc<dyn Explainer>,
}

impl AnnotatorSet {
    /// The built-in rule-based chain.
    pub fn rule_based() -> Self {
        Self {
            transcriber: Arc::new(CannedTranscriber::new()),
            classifier: Arc::new(KeywordClassifier::new()),
            severity: Arc::new(KeywordSeverityRater::new()),
            locator: Arc::new(TokenScanLocator::new()),
            explainer: Arc::new(KeywordExplainer::new()),
        }
    }
}
