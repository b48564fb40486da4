use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use call_triage::annotate::AnnotatorSet;
use call_triage::session::{SessionLimits, SessionManager};
use call_triage::store::JsonlStore;
use call_triage::{create_router, AppState, Config};

#[derive(Debug, Parser)]
#[command(name = "call-triage", about = "Real-time emergency call triage service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/call-triage")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);
    info!(
        "Max concurrent calls: {}, idle timeout: {}s",
        cfg.calls.max_concurrent, cfg.calls.idle_timeout_secs
    );
    info!("Records file: {}", cfg.storage.records_path);

    let services = AnnotatorSet::rule_based();
    let store = Arc::new(JsonlStore::new(&cfg.storage.records_path));
    let manager = SessionManager::new(services.clone(), store, SessionLimits::from(&cfg));

    let state = AppState::new(
        manager,
        services,
        Duration::from_secs(cfg.calls.idle_timeout_secs),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
