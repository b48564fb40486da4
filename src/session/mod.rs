//! Call session management.
//!
//! This module provides the per-call `CallSession` (ingest buffer, call
//! record, pipeline orchestrator) and the `SessionManager` that maps
//! call identifiers to sessions:
//! - At most one live session per call id
//! - Capacity limiting over the open-session table
//! - Finalize-on-close with best-effort persistence

mod config;
mod manager;
mod record;
mod session;

pub use config::{CallSettings, SessionLimits};
pub use manager::{CallEvent, SessionManager};
pub use record::{
    CallRecord, CallStatus, EmergencyKind, FlatCallRecord, RoutingDecision, SeverityLevel,
    StageResult, Staged, NO_LOCATION, UNKNOWN_TRANSCRIPT,
};
pub use session::CallSession;
