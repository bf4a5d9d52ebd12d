//! Session state types

use crate::engine::{
    ConditionDetails, ConditionScores, EngineErrorKind, FinalAnalysis, InitialAnalysis,
    SymptomSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

static NO_SYMPTOMS: SymptomSet = SymptomSet::new();
static NO_SCORES: ConditionScores = ConditionScores::new();
static NO_DETAILS: ConditionDetails = BTreeMap::new();

/// Which engine call a result or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Initial,
    Final,
}

/// Flat phase name, for display and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    AwaitingInitial,
    InitialReady,
    AwaitingFinal,
    FinalReady,
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingInitial => "awaiting_initial",
            Phase::InitialReady => "initial_ready",
            Phase::AwaitingFinal => "awaiting_final",
            Phase::FinalReady => "final_ready",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Analysis session state
///
/// Each variant carries exactly the data that is valid in that phase, so a
/// session can never hold scores from one phase next to details from another.
/// Follow-up selection is stored as question indices and therefore can only
/// name questions that were displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing submitted yet
    #[default]
    Idle,

    /// Initial analysis request in flight
    AwaitingInitial { request_id: String, text: String },

    /// Initial results shown, follow-up selection accumulating
    InitialReady {
        analysis: InitialAnalysis,
        #[serde(default)]
        selected: BTreeSet<usize>,
    },

    /// Final analysis request in flight
    AwaitingFinal {
        request_id: String,
        analysis: InitialAnalysis,
        selected: BTreeSet<usize>,
    },

    /// Final report available
    FinalReady {
        initial: InitialAnalysis,
        selected: BTreeSet<usize>,
        result: FinalAnalysis,
    },

    /// An engine call failed; only reset or a fresh submission leave this state
    Error {
        stage: AnalysisStage,
        message: String,
        error_kind: EngineErrorKind,
    },
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::AwaitingInitial { .. } => Phase::AwaitingInitial,
            SessionState::InitialReady { .. } => Phase::InitialReady,
            SessionState::AwaitingFinal { .. } => Phase::AwaitingFinal,
            SessionState::FinalReady { .. } => Phase::FinalReady,
            SessionState::Error { .. } => Phase::Error,
        }
    }

    /// Engine call currently in flight, if any
    pub fn pending_request(&self) -> Option<(AnalysisStage, &str)> {
        match self {
            SessionState::AwaitingInitial { request_id, .. } => {
                Some((AnalysisStage::Initial, request_id.as_str()))
            }
            SessionState::AwaitingFinal { request_id, .. } => {
                Some((AnalysisStage::Final, request_id.as_str()))
            }
            _ => None,
        }
    }

    fn initial_analysis(&self) -> Option<(&InitialAnalysis, &BTreeSet<usize>)> {
        match self {
            SessionState::InitialReady { analysis, selected }
            | SessionState::AwaitingFinal {
                analysis, selected, ..
            } => Some((analysis, selected)),
            SessionState::FinalReady {
                initial, selected, ..
            } => Some((initial, selected)),
            _ => None,
        }
    }

    pub fn initial_symptoms(&self) -> &SymptomSet {
        self.initial_analysis()
            .map_or(&NO_SYMPTOMS, |(a, _)| &a.detected_symptoms)
    }

    pub fn follow_up_questions(&self) -> &[String] {
        self.initial_analysis()
            .map(|(a, _)| a.follow_up_questions.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_indices(&self) -> Option<&BTreeSet<usize>> {
        self.initial_analysis().map(|(_, selected)| selected)
    }

    /// Texts of the checked follow-up questions, in question order
    pub fn selected_follow_up(&self) -> SymptomSet {
        self.initial_analysis()
            .map(|(analysis, selected)| selected_texts(analysis, selected))
            .unwrap_or_default()
    }

    /// Scores of the most recent completed phase
    pub fn condition_scores(&self) -> &ConditionScores {
        match self {
            SessionState::InitialReady { analysis, .. }
            | SessionState::AwaitingFinal { analysis, .. } => &analysis.potential_conditions,
            SessionState::FinalReady { result, .. } => &result.potential_conditions,
            _ => &NO_SCORES,
        }
    }

    pub fn condition_details(&self) -> &ConditionDetails {
        match self {
            SessionState::FinalReady { result, .. } => &result.condition_details,
            _ => &NO_DETAILS,
        }
    }

    /// Initial symptoms followed by the selected follow-up answers
    pub fn all_symptoms(&self) -> SymptomSet {
        self.initial_symptoms().union(&self.selected_follow_up())
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending_request().is_some()
    }
}

pub(super) fn selected_texts(analysis: &InitialAnalysis, selected: &BTreeSet<usize>) -> SymptomSet {
    selected
        .iter()
        .filter_map(|&i| analysis.follow_up_questions.get(i))
        .cloned()
        .collect()
}

// ============================================================================
// Session Context
// ============================================================================

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
        }
    }
}
