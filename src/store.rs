use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use crate::session::FlatCallRecord;

/// Append-only persistence of finalized call records.
///
/// Durability is best-effort: a crash between finalize and append loses
/// that record, and the caller does not retry.
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    async fn append(&self, record: &FlatCallRecord) -> Result<()>;

    /// Most recent first.
    async fn list(&self, limit: usize) -> Result<Vec<FlatCallRecord>>;
}

/// JSON-lines file store: one self-contained record object per line.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CallRecordStore for JsonlStore {
    async fn append(&self, record: &FlatCallRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create records directory")?;
            }
        }

        let line = serde_json::to_string(record).context("Failed to serialize call record")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open records file: {:?}", self.path))?;

        writeln!(file, "{}", line).context("Failed to append call record")?;

        info!(call_id = %record.call_id, "Appended finalized call record");

        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<FlatCallRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read records file: {:?}", self.path))
            }
        };

        let mut records: Vec<FlatCallRecord> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()
            .context("Failed to parse call record line")?;

        records.reverse();
        records.truncate(limit);

        Ok(records)
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<FlatCallRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallRecordStore for MemoryStore {
    async fn append(&self, record: &FlatCallRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<FlatCallRecord>> {
        let records = self.records.lock().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
