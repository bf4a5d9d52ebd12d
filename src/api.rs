//! HTTP API for the triage service

mod error;
mod handlers;
mod sse;
mod types;

pub use error::ApiError;
pub use handlers::create_router;

use crate::coordinator::AnalysisCoordinator;
use crate::engine::InferenceEngine;
use crate::runtime::SessionManager;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    /// Engine served over `/analyze` and `/final_analysis`
    pub local_engine: Arc<dyn InferenceEngine>,
}

impl AppState {
    pub fn new(
        session_engine: Arc<dyn InferenceEngine>,
        local_engine: Arc<dyn InferenceEngine>,
        session_idle_timeout: Duration,
    ) -> Self {
        let coordinator = AnalysisCoordinator::new(session_engine);
        Self {
            sessions: Arc::new(SessionManager::new(coordinator, session_idle_timeout)),
            local_engine,
        }
    }
}
