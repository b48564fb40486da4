// Shared test doubles and helpers for the integration tests.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use call_triage::annotate::{
    AnnotatorSet, KeywordClassifier, KeywordExplainer, KeywordSeverityRater, TokenScanLocator,
    Transcriber, Transcription,
};
use call_triage::audio::{AudioFragment, AudioSnapshot};
use call_triage::session::{
    CallSession, CallSettings, CallStatus, EmergencyKind, FlatCallRecord, RoutingDecision,
    SeverityLevel,
};

/// Transcriber that "decodes" the snapshot by reading its PCM bytes as
/// UTF-8, so tests control the transcript through the audio they push.
pub struct EchoTranscriber;

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioSnapshot,
        _settings: &CallSettings,
    ) -> Result<Transcription> {
        if audio.is_empty() {
            bail!("no audio to transcribe");
        }
        Ok(Transcription {
            text: String::from_utf8_lossy(&audio.pcm).into_owned(),
            confidence: 0.9,
        })
    }
}

/// Transcriber that is permanently unavailable.
pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(
        &self,
        _audio: &AudioSnapshot,
        _settings: &CallSettings,
    ) -> Result<Transcription> {
        bail!("transcription backend offline");
    }
}

/// Transcriber that blocks until the test releases it, counting calls.
/// Lets tests hold an annotation run in flight deterministically.
pub struct GatedTranscriber {
    calls: AtomicUsize,
    gate: Semaphore,
}

impl GatedTranscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl Transcriber for GatedTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioSnapshot,
        _settings: &CallSettings,
    ) -> Result<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("gate closed"))?;
        permit.forget();
        Ok(Transcription {
            text: String::from_utf8_lossy(&audio.pcm).into_owned(),
            confidence: 0.9,
        })
    }
}

/// The rule-based chain with a custom transcriber in front.
pub fn services_with(transcriber: Arc<dyn Transcriber>) -> AnnotatorSet {
    AnnotatorSet {
        transcriber,
        classifier: Arc::new(KeywordClassifier::new()),
        severity: Arc::new(KeywordSeverityRater::new()),
        locator: Arc::new(TokenScanLocator::new()),
        explainer: Arc::new(KeywordExplainer::new()),
    }
}

/// A session wired for tests: generous budgets, no recording.
pub fn test_session(call_id: &str, services: AnnotatorSet) -> Arc<CallSession> {
    CallSession::new(
        call_id,
        CallSettings::default(),
        services,
        100,
        250,
        Duration::from_secs(5),
    )
}

pub fn text_fragment(sequence: u64, text: &str) -> AudioFragment {
    AudioFragment::new(sequence, text.as_bytes().to_vec(), 0.5)
}

/// Poll until the session's pipeline goes idle.
pub async fn wait_for_idle(session: &Arc<CallSession>) {
    for _ in 0..500 {
        if !session.pipeline_running().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pipeline did not go idle");
}

/// A minimal flat record with a given aggregate version.
pub fn flat_record(call_id: &str, aggregate_version: u64) -> FlatCallRecord {
    FlatCallRecord {
        call_id: call_id.to_string(),
        timestamp: Utc::now(),
        transcript: "test transcript".to_string(),
        predicted_class: EmergencyKind::Medical,
        confidence: 0.9,
        severity: SeverityLevel::High,
        location: "123 Main St".to_string(),
        routing_decision: RoutingDecision::derive(EmergencyKind::Medical, 0.9, 0.9),
        explanation: "test explanation".to_string(),
        status: CallStatus::Open,
        aggregate_version,
        finalized_at: None,
    }
}
