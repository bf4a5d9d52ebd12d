//! Effects produced by state transitions

use crate::engine::FinalAnalysisRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call the engine for the initial analysis (spawns as background task)
    RequestInitialAnalysis { request_id: String, text: String },

    /// Call the engine for the final analysis (spawns as background task)
    RequestFinalAnalysis {
        request_id: String,
        request: FinalAnalysisRequest,
    },

    /// Push the new session snapshot to subscribers
    BroadcastState,

    /// Push a dismissible error notification to subscribers
    NotifyError { message: String },
}

impl Effect {
    pub fn request_initial(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::RequestInitialAnalysis {
            request_id: request_id.into(),
            text: text.into(),
        }
    }

    pub fn request_final(request_id: impl Into<String>, request: FinalAnalysisRequest) -> Self {
        Effect::RequestFinalAnalysis {
            request_id: request_id.into(),
            request,
        }
    }

    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            message: message.into(),
        }
    }

    #[allow(dead_code)] // Used by property tests
    pub fn is_engine_request(&self) -> bool {
        matches!(
            self,
            Effect::RequestInitialAnalysis { .. } | Effect::RequestFinalAnalysis { .. }
        )
    }
}
