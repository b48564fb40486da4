use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::info;

use super::config::CallSettings;
use super::record::{CallRecord, FlatCallRecord};
use crate::annotate::AnnotatorSet;
use crate::audio::{AudioFragment, IngestBuffer};
use crate::error::TriageError;
use crate::pipeline::Orchestrator;
use crate::publish::ResultPublisher;

/// One live emergency call.
///
/// Owns the ingest buffer, the mutable call record, and the pipeline
/// orchestrator for this call only; nothing here is shared across calls.
pub struct CallSession {
    call_id: String,
    settings: Arc<RwLock<CallSettings>>,
    buffer: Arc<Mutex<IngestBuffer>>,
    record: Arc<Mutex<CallRecord>>,
    publisher: Arc<ResultPublisher>,
    orchestrator: Arc<Orchestrator>,
    closed: Arc<AtomicBool>,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("call_id", &self.call_id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl CallSession {
    pub fn new(
        call_id: impl Into<String>,
        settings: CallSettings,
        services: AnnotatorSet,
        fragment_budget: u64,
        nominal_fragment_ms: u64,
        stage_timeout: Duration,
    ) -> Arc<Self> {
        let call_id = call_id.into();
        info!(call_id = %call_id, "Creating call session");

        let buffer = Arc::new(Mutex::new(IngestBuffer::new(
            fragment_budget,
            nominal_fragment_ms,
        )));
        let record = Arc::new(Mutex::new(CallRecord::new(call_id.clone(), settings.clone())));
        let settings = Arc::new(RwLock::new(settings));
        let publisher = Arc::new(ResultPublisher::default());
        let closed = Arc::new(AtomicBool::new(false));

        let orchestrator = Arc::new(Orchestrator::new(
            call_id.clone(),
            Arc::clone(&buffer),
            Arc::clone(&record),
            Arc::clone(&settings),
            Arc::clone(&publisher),
            services,
            Arc::clone(&closed),
            stage_timeout,
        ));

        Arc::new(Self {
            call_id,
            settings,
            buffer,
            record,
            publisher,
            orchestrator,
            closed,
            created_at: Utc::now(),
        })
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Observe this call's ordered snapshot sequence.
    pub fn subscribe(&self) -> broadcast::Receiver<FlatCallRecord> {
        self.publisher.subscribe()
    }

    /// Apply a (re-sent) config frame without resetting the pipeline.
    pub async fn update_settings(&self, settings: CallSettings) {
        *self.settings.write().await = settings.clone();
        self.record.lock().await.update_settings(settings);
    }

    /// Accept the next audio fragment and trigger re-annotation.
    ///
    /// Rejection (out-of-order, over budget, closed) leaves the snapshot
    /// version untouched and is reported to the caller.
    pub async fn push_audio(self: &Arc<Self>, fragment: AudioFragment) -> Result<u64, TriageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TriageError::StreamClosed);
        }

        let version = self.buffer.lock().await.accept(fragment)?;
        self.orchestrator.trigger().await;
        Ok(version)
    }

    /// Current flat view of the record, for status queries.
    pub async fn snapshot_record(&self) -> FlatCallRecord {
        self.record.lock().await.flat()
    }

    pub async fn pipeline_running(&self) -> bool {
        self.orchestrator.is_running().await
    }

    /// One-way finalize: close the stream, freeze the record, publish
    /// the final snapshot. An annotation run still in flight completes
    /// but its results are discarded.
    pub async fn finalize(&self) -> FlatCallRecord {
        // First close wins; later calls just read the frozen record.
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.buffer.lock().await.close();

            let flat = {
                let mut record = self.record.lock().await;
                record.finalize();
                record.flat()
            };

            info!(call_id = %self.call_id, "Call finalized");
            self.publisher.publish(flat.clone()).await;
            return flat;
        }

        self.record.lock().await.flat()
    }

    /// Drain the call's accumulated PCM for the recording writer.
    pub async fn take_audio(&self) -> Vec<u8> {
        self.buffer.lock().await.take_pcm()
    }
}
