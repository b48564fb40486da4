use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::config::{CallSettings, SessionLimits};
use super::record::FlatCallRecord;
use super::session::CallSession;
use crate::annotate::AnnotatorSet;
use crate::audio::{write_call_recording, AudioFragment};
use crate::error::TriageError;
use crate::store::CallRecordStore;

/// An event routed to a call's session by the transport layer.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// Configuration frame; re-sending updates settings in place
    Config(CallSettings),
    /// The next audio fragment
    Audio(AudioFragment),
}

/// Maps call identifiers to live sessions.
///
/// The session table is the only process-wide mutable state; everything
/// else is owned per-session. At most one live session exists per call
/// id, and the table length enforces the concurrent-call cap.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<CallSession>>>,
    finalized: RwLock<HashMap<String, FlatCallRecord>>,
    services: AnnotatorSet,
    store: Arc<dyn CallRecordStore>,
    limits: SessionLimits,
}

impl SessionManager {
    pub fn new(
        services: AnnotatorSet,
        store: Arc<dyn CallRecordStore>,
        limits: SessionLimits,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            finalized: RwLock::new(HashMap::new()),
            services,
            store,
            limits,
        })
    }

    /// Open a session for a new call.
    ///
    /// A second `open` for an in-flight call id fails rather than
    /// replacing the first session.
    pub async fn open(
        &self,
        call_id: &str,
        settings: CallSettings,
    ) -> Result<Arc<CallSession>, TriageError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(call_id) {
            warn!(call_id, "Rejecting duplicate open");
            return Err(TriageError::DuplicateCall(call_id.to_string()));
        }

        if sessions.len() >= self.limits.max_concurrent_calls {
            warn!(
                call_id,
                open = sessions.len(),
                "Rejecting open: at capacity"
            );
            return Err(TriageError::CapacityExceeded {
                limit: self.limits.max_concurrent_calls,
            });
        }

        let session = CallSession::new(
            call_id,
            settings,
            self.services.clone(),
            self.limits.fragment_budget,
            self.limits.nominal_fragment_ms,
            self.limits.stage_timeout,
        );
        sessions.insert(call_id.to_string(), Arc::clone(&session));

        info!(call_id, open = sessions.len(), "Call session opened");

        Ok(session)
    }

    /// Route one event to the matching session.
    pub async fn dispatch(&self, call_id: &str, event: CallEvent) -> Result<(), TriageError> {
        let session = self.get(call_id).await?;

        match event {
            CallEvent::Config(settings) => {
                session.update_settings(settings).await;
                Ok(())
            }
            CallEvent::Audio(fragment) => {
                session.push_audio(fragment).await?;
                Ok(())
            }
        }
    }

    /// Look up a live session.
    pub async fn get(&self, call_id: &str) -> Result<Arc<CallSession>, TriageError> {
        self.sessions
            .read()
            .await
            .get(call_id)
            .cloned()
            .ok_or_else(|| TriageError::UnknownCall(call_id.to_string()))
    }

    /// Finalize and destroy a call's session.
    ///
    /// The finalized record is appended to the store and cached, so a
    /// repeated `close` returns the same record without side effects.
    /// Closing a call that was never opened is an error.
    pub async fn close(&self, call_id: &str) -> Result<FlatCallRecord, TriageError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(call_id)
        };

        let session = match session {
            Some(s) => s,
            None => {
                // Already closed: serve the cached finalized record.
                return self
                    .finalized
                    .read()
                    .await
                    .get(call_id)
                    .cloned()
                    .ok_or_else(|| TriageError::UnknownCall(call_id.to_string()));
            }
        };

        let record = session.finalize().await;

        // Best-effort persistence: losing the append loses the record,
        // never the close.
        if let Err(e) = self.store.append(&record).await {
            error!(call_id, error = %e, "Failed to append finalized record");
        }

        if let Some(dir) = &self.limits.recordings_dir {
            let pcm = session.take_audio().await;
            if let Err(e) = write_call_recording(dir, call_id, &pcm) {
                error!(call_id, error = %e, "Failed to write call recording");
            }
        }

        self.finalized
            .write()
            .await
            .insert(call_id.to_string(), record.clone());

        info!(call_id, "Call session closed");

        Ok(record)
    }

    /// Number of currently open sessions.
    pub async fn open_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn store(&self) -> &Arc<dyn CallRecordStore> {
        &self.store
    }
}
