use std::sync::Arc;
use std::time::Duration;

use crate::annotate::AnnotatorSet;
use crate::session::SessionManager;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Session manager routing call events to live sessions
    pub manager: Arc<SessionManager>,

    /// Annotation services, used directly by the text-only endpoints
    pub services: AnnotatorSet,

    /// Idle timeout applied to live call connections
    pub idle_timeout: Duration,
}

impl AppState {
    pub fn new(manager: Arc<SessionManager>, services: AnnotatorSet, idle_timeout: Duration) -> Self {
        Self {
            manager,
            services,
            idle_timeout,
        }
    }
}
