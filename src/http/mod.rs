//! HTTP surface: live call ingest plus companion queries.
//!
//! - GET  /ws/calls/:call_id - WebSocket carrying config/audio frames in
//!   and full record snapshots out
//! - GET  /api/calls - finalized records, most recent first
//! - POST /api/classify - annotate raw text, bypassing the pipeline
//! - GET  /api/simulate/:scenario - synthesize a record from a canned scenario
//! - GET  /health - health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
