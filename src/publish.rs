use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::session::FlatCallRecord;

/// Delivers ordered call-record snapshots to every observer of a call.
///
/// Ordering is enforced here rather than assumed from pipeline completion
/// order: concurrent stages can finish out of order, so a snapshot whose
/// aggregate version is older than one already delivered is dropped. All
/// observers (live connection, audit log) receive the same sequence.
pub struct ResultPublisher {
    tx: broadcast::Sender<FlatCallRecord>,
    last_version: Mutex<u64>,
}

impl ResultPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            last_version: Mutex::new(0),
        }
    }

    /// Returns a new receiver for this call's snapshot sequence.
    pub fn subscribe(&self) -> broadcast::Receiver<FlatCallRecord> {
        self.tx.subscribe()
    }

    /// Publish a snapshot to all observers. Returns whether it was
    /// delivered; stale snapshots are silently dropped.
    pub async fn publish(&self, record: FlatCallRecord) -> bool {
        {
            let mut last = self.last_version.lock().await;
            if record.aggregate_version < *last {
                debug!(
                    call_id = %record.call_id,
                    version = record.aggregate_version,
                    delivered = *last,
                    "Dropping stale snapshot"
                );
                return false;
            }
            *last = record.aggregate_version;
        }

        // A send error only means no observer is currently attached.
        let _ = self.tx.send(record);
        true
    }
}

impl Default for ResultPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}
