//! Pure state transition function

use super::state::{selected_texts, AnalysisStage, Phase};
use super::{Effect, Event, SessionContext, SessionState};
use crate::engine::FinalAnalysisRequest;
use std::collections::BTreeSet;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition. The session state is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{0}")]
    Validation(String),
    #[error("Follow-up question {index} does not exist ({len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Cannot {operation} while the session is {phase}")]
    InvalidState {
        phase: Phase,
        operation: &'static str,
    },
    #[error("Result for request {request_id} is stale")]
    StaleResult { request_id: String },
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; engine calls
/// and notifications are returned as effects for the runtime to execute.
pub fn transition(
    state: &SessionState,
    _context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Symptom submission
        // ============================================================

        // Idle / FinalReady / Error + SubmitSymptoms -> AwaitingInitial
        // (FinalReady and Error discard their data, an implicit reset)
        (
            SessionState::Idle | SessionState::FinalReady { .. } | SessionState::Error { .. },
            Event::SubmitSymptoms { text, request_id },
        ) => {
            let text = validated_symptom_text(&text)?;
            Ok(TransitionResult::new(SessionState::AwaitingInitial {
                request_id: request_id.clone(),
                text: text.clone(),
            })
            .with_effect(Effect::BroadcastState)
            .with_effect(Effect::request_initial(request_id, text)))
        }

        // AwaitingInitial + InitialAnalysisComplete -> InitialReady
        (
            SessionState::AwaitingInitial {
                request_id: pending,
                ..
            },
            Event::InitialAnalysisComplete {
                request_id,
                analysis,
            },
        ) => {
            ensure_current(pending, request_id)?;
            Ok(TransitionResult::new(SessionState::InitialReady {
                analysis,
                selected: BTreeSet::new(),
            })
            .with_effect(Effect::BroadcastState))
        }

        // ============================================================
        // Follow-up selection
        // ============================================================

        // InitialReady + ToggleFollowUp -> InitialReady (selection flipped)
        (SessionState::InitialReady { analysis, selected }, Event::ToggleFollowUp { index }) => {
            let len = analysis.follow_up_questions.len();
            if index >= len {
                return Err(TransitionError::IndexOutOfRange { index, len });
            }

            let mut selected = selected.clone();
            if !selected.remove(&index) {
                selected.insert(index);
            }

            Ok(TransitionResult::new(SessionState::InitialReady {
                analysis: analysis.clone(),
                selected,
            })
            .with_effect(Effect::BroadcastState))
        }

        // InitialReady + SubmitFollowUp -> AwaitingFinal
        (
            SessionState::InitialReady { analysis, selected },
            Event::SubmitFollowUp { request_id },
        ) => {
            if selected.is_empty() {
                return Err(TransitionError::Validation(
                    "Please select at least one follow-up symptom".to_string(),
                ));
            }

            let follow_up = selected_texts(analysis, selected);
            let request = FinalAnalysisRequest::new(analysis.detected_symptoms.clone(), &follow_up);

            Ok(TransitionResult::new(SessionState::AwaitingFinal {
                request_id: request_id.clone(),
                analysis: analysis.clone(),
                selected: selected.clone(),
            })
            .with_effect(Effect::BroadcastState)
            .with_effect(Effect::request_final(request_id, request)))
        }

        // AwaitingFinal + FinalAnalysisComplete -> FinalReady
        (
            SessionState::AwaitingFinal {
                request_id: pending,
                analysis: initial,
                selected,
            },
            Event::FinalAnalysisComplete {
                request_id,
                analysis,
            },
        ) => {
            ensure_current(pending, request_id)?;
            Ok(TransitionResult::new(SessionState::FinalReady {
                initial: initial.clone(),
                selected: selected.clone(),
                result: analysis,
            })
            .with_effect(Effect::BroadcastState))
        }

        // ============================================================
        // Engine failure
        // ============================================================

        // Awaiting + AnalysisFailed (matching stage) -> Error, nothing kept
        (
            SessionState::AwaitingInitial {
                request_id: pending,
                ..
            },
            Event::AnalysisFailed {
                stage: stage @ AnalysisStage::Initial,
                request_id,
                error,
            },
        )
        | (
            SessionState::AwaitingFinal {
                request_id: pending,
                ..
            },
            Event::AnalysisFailed {
                stage: stage @ AnalysisStage::Final,
                request_id,
                error,
            },
        ) => {
            ensure_current(pending, request_id)?;
            Ok(TransitionResult::new(SessionState::Error {
                stage,
                message: error.message.clone(),
                error_kind: error.kind,
            })
            .with_effect(Effect::BroadcastState)
            .with_effect(Effect::notify_error(error.message)))
        }

        // ============================================================
        // Reset
        // ============================================================

        // Any state + Reset -> Idle
        (_, Event::Reset) => {
            Ok(TransitionResult::new(SessionState::Idle).with_effect(Effect::BroadcastState))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidState {
            phase: state.phase(),
            operation: event.operation(),
        }),
    }
}

fn validated_symptom_text(text: &str) -> Result<String, TransitionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TransitionError::Validation(
            "Please enter your symptoms".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn ensure_current(pending: &str, request_id: String) -> Result<(), TransitionError> {
    if pending == request_id {
        Ok(())
    } else {
        Err(TransitionError::StaleResult { request_id })
    }
}
