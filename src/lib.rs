pub mod annotate;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod publish;
pub mod session;
pub mod store;

pub use annotate::{
    AnnotatorSet, Classifier, Explainer, Locator, SeverityRater, Transcriber,
};
pub use audio::{AudioFragment, AudioSnapshot, IngestBuffer};
pub use config::Config;
pub use error::TriageError;
pub use http::{create_router, AppState};
pub use pipeline::{annotate_text, Orchestrator, TextAnnotation};
pub use publish::ResultPublisher;
pub use session::{
    CallEvent, CallRecord, CallSession, CallSettings, CallStatus, EmergencyKind, FlatCallRecord,
    RoutingDecision, SessionLimits, SessionManager, SeverityLevel,
};
pub use store::{CallRecordStore, JsonlStore, MemoryStore};
