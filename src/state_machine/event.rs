//! Events that can occur in a session

use super::state::AnalysisStage;
use crate::engine::{EngineError, FinalAnalysis, InitialAnalysis};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    SubmitSymptoms {
        text: String,
        /// Correlates the engine result with this submission
        request_id: String,
    },
    ToggleFollowUp {
        index: usize,
    },
    SubmitFollowUp {
        request_id: String,
    },
    Reset,

    // Engine events
    InitialAnalysisComplete {
        request_id: String,
        analysis: InitialAnalysis,
    },
    FinalAnalysisComplete {
        request_id: String,
        analysis: FinalAnalysis,
    },
    AnalysisFailed {
        stage: AnalysisStage,
        request_id: String,
        error: EngineError,
    },
}

impl Event {
    /// Human-readable operation name, used in wrong-phase errors
    pub fn operation(&self) -> &'static str {
        match self {
            Event::SubmitSymptoms { .. } => "submit symptoms",
            Event::ToggleFollowUp { .. } => "toggle a follow-up question",
            Event::SubmitFollowUp { .. } => "submit follow-up answers",
            Event::Reset => "reset",
            Event::InitialAnalysisComplete { .. } => "accept an initial analysis",
            Event::FinalAnalysisComplete { .. } => "accept a final analysis",
            Event::AnalysisFailed { .. } => "record an analysis failure",
        }
    }

    /// Whether this event comes from the engine rather than the user
    pub fn is_engine_result(&self) -> bool {
        matches!(
            self,
            Event::InitialAnalysisComplete { .. }
                | Event::FinalAnalysisComplete { .. }
                | Event::AnalysisFailed { .. }
        )
    }

    /// Request id of an engine result
    pub fn result_request_id(&self) -> Option<&str> {
        match self {
            Event::InitialAnalysisComplete { request_id, .. }
            | Event::FinalAnalysisComplete { request_id, .. }
            | Event::AnalysisFailed { request_id, .. } => Some(request_id.as_str()),
            _ => None,
        }
    }

    pub fn submit_symptoms(text: impl Into<String>) -> Self {
        Event::SubmitSymptoms {
            text: text.into(),
            request_id: new_request_id(),
        }
    }

    pub fn submit_follow_up() -> Self {
        Event::SubmitFollowUp {
            request_id: new_request_id(),
        }
    }
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
