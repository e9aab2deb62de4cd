//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::scheduling::SchedulingEngine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for entity reads
    pub repository: Arc<dyn FullRepository>,
    /// Scheduling engine for allocation and ledger operations
    pub engine: Arc<SchedulingEngine>,
}

impl AppState {
    /// Create application state over the given repository with a default
    /// engine (no instructor location lookup).
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let engine = Arc::new(SchedulingEngine::new(Arc::clone(&repository)));
        Self { repository, engine }
    }

    /// Create application state with an explicitly configured engine.
    pub fn with_engine(repository: Arc<dyn FullRepository>, engine: Arc<SchedulingEngine>) -> Self {
        Self { repository, engine }
    }
}
