use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub calls: CallsConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallsConfig {
    /// Maximum number of concurrently open call sessions
    pub max_concurrent: usize,

    /// Idle timeout in seconds before an open call is force-finalized
    pub idle_timeout_secs: u64,

    /// Maximum cumulative audio duration per call in seconds
    pub max_call_secs: u64,

    /// Nominal duration of one audio fragment in milliseconds
    pub nominal_fragment_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Per-stage annotation budget in milliseconds
    pub stage_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Append-only JSON-lines file of finalized call records
    pub records_path: String,

    /// Directory for finalized call audio (WAV)
    pub recordings_dir: String,
}

impl Config {
    /// Load configuration from a TOML file, falling back to built-in
    /// defaults for anything the file does not set. The file itself is
    /// optional so the service can run out of the box.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "call-triage")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8000_i64)?
            .set_default("calls.max_concurrent", 64_i64)?
            .set_default("calls.idle_timeout_secs", 30_i64)?
            .set_default("calls.max_call_secs", 600_i64)?
            .set_default("calls.nominal_fragment_ms", 250_i64)?
            .set_default("pipeline.stage_timeout_ms", 300_i64)?
            .set_default("storage.records_path", "logs/calls.jsonl")?
            .set_default("storage.recordings_dir", "recordings")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
