//! Property-based tests for the session state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::engine::{
    ConditionDetail, ConditionScores, EngineError, EngineErrorKind, FinalAnalysis,
    InitialAnalysis, SymptomSet,
};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session")
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_symptom() -> impl Strategy<Value = String> {
    "[a-z]{3,10}( [a-z]{3,8})?"
}

fn arb_symptom_set() -> impl Strategy<Value = SymptomSet> {
    proptest::collection::vec(arb_symptom(), 0..5).prop_map(|v| v.into_iter().collect())
}

fn arb_scores() -> impl Strategy<Value = ConditionScores> {
    proptest::collection::btree_map("[a-z]{3,12}", 0.0f64..=1.0, 0..4)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_initial_analysis() -> impl Strategy<Value = InitialAnalysis> {
    (
        arb_symptom_set(),
        arb_scores(),
        proptest::collection::vec("[A-Z][a-z ]{5,30}\\?", 1..6),
    )
        .prop_map(
            |(detected_symptoms, potential_conditions, follow_up_questions)| InitialAnalysis {
                detected_symptoms,
                potential_conditions,
                follow_up_questions,
            },
        )
}

fn arb_final_analysis() -> impl Strategy<Value = FinalAnalysis> {
    arb_scores().prop_map(|potential_conditions| {
        let condition_details = potential_conditions
            .iter()
            .map(|(name, _)| (name.to_string(), ConditionDetail::default()))
            .collect();
        FinalAnalysis {
            potential_conditions,
            condition_details,
        }
    })
}

fn arb_engine_error() -> impl Strategy<Value = EngineError> {
    (
        prop_oneof![
            Just(EngineErrorKind::Transport),
            Just(EngineErrorKind::Timeout),
            Just(EngineErrorKind::HttpStatus),
            Just(EngineErrorKind::Rejected),
            Just(EngineErrorKind::Malformed),
        ],
        "[a-zA-Z ]{1,30}",
    )
        .prop_map(|(kind, message)| EngineError::new(kind, message))
}

fn arb_stage() -> impl Strategy<Value = AnalysisStage> {
    prop_oneof![Just(AnalysisStage::Initial), Just(AnalysisStage::Final)]
}

fn arb_initial_ready_state() -> impl Strategy<Value = SessionState> {
    arb_initial_analysis().prop_flat_map(|analysis| {
        let len = analysis.follow_up_questions.len();
        proptest::collection::vec(any::<bool>(), len).prop_map(move |flags| {
            SessionState::InitialReady {
                analysis: analysis.clone(),
                selected: flags
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &on)| on.then_some(i))
                    .collect(),
            }
        })
    })
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        ("req-[0-9]", arb_symptom())
            .prop_map(|(request_id, text)| SessionState::AwaitingInitial { request_id, text }),
        arb_initial_ready_state(),
        ("req-[0-9]", arb_initial_ready_state()).prop_map(|(request_id, state)| match state {
            SessionState::InitialReady { analysis, selected } => SessionState::AwaitingFinal {
                request_id,
                analysis,
                selected,
            },
            other => other,
        }),
        (arb_initial_ready_state(), arb_final_analysis()).prop_map(|(state, result)| {
            match state {
                SessionState::InitialReady { analysis, selected } => SessionState::FinalReady {
                    initial: analysis,
                    selected,
                    result,
                },
                other => other,
            }
        }),
        (arb_stage(), arb_engine_error()).prop_map(|(stage, error)| SessionState::Error {
            stage,
            message: error.message,
            error_kind: error.kind,
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ("[a-z ]{0,20}", "req-[0-9]")
            .prop_map(|(text, request_id)| Event::SubmitSymptoms { text, request_id }),
        (0usize..8).prop_map(|index| Event::ToggleFollowUp { index }),
        "req-[0-9]".prop_map(|request_id| Event::SubmitFollowUp { request_id }),
        Just(Event::Reset),
        ("req-[0-9]", arb_initial_analysis()).prop_map(|(request_id, analysis)| {
            Event::InitialAnalysisComplete {
                request_id,
                analysis,
            }
        }),
        ("req-[0-9]", arb_final_analysis()).prop_map(|(request_id, analysis)| {
            Event::FinalAnalysisComplete {
                request_id,
                analysis,
            }
        }),
        (arb_stage(), "req-[0-9]", arb_engine_error()).prop_map(|(stage, request_id, error)| {
            Event::AnalysisFailed {
                stage,
                request_id,
                error,
            }
        }),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &SessionState) -> bool {
    match state {
        SessionState::InitialReady { analysis, selected }
        | SessionState::AwaitingFinal {
            analysis, selected, ..
        }
        | SessionState::FinalReady {
            initial: analysis,
            selected,
            ..
        } => selected
            .iter()
            .all(|&i| i < analysis.follow_up_questions.len()),
        SessionState::AwaitingInitial { text, .. } => !text.trim().is_empty(),
        _ => true,
    }
}

fn effects_are_valid(effects: &[Effect], new_state: &SessionState) -> bool {
    let engine_requests = effects.iter().filter(|e| e.is_engine_request()).count();

    // Engine requests only leave the machine together with an awaiting state
    if engine_requests > 0 && !new_state.is_awaiting() {
        return false;
    }
    engine_requests <= 1
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state after any sequence of transitions
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = SessionState::Idle;
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
                prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
                prop_assert!(
                    effects_are_valid(&result.effects, &state),
                    "Invalid effects for state {:?}: {:?}",
                    state,
                    result.effects
                );
            }
        }
    }

    // Invariant 2: Every accepted transition broadcasts the new state
    #[test]
    fn prop_state_changes_broadcast(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            prop_assert!(
                result.effects.contains(&Effect::BroadcastState),
                "Transition without broadcast: {:?} -> {:?}",
                state,
                result.new_state
            );
        }
    }

    // Invariant 3: Toggling the same index twice restores the selection
    #[test]
    fn prop_double_toggle_is_identity(state in arb_initial_ready_state(), raw in 0usize..8) {
        let len = state.follow_up_questions().len();
        let index = raw % len;
        let ctx = test_context();

        let once = transition(&state, &ctx, Event::ToggleFollowUp { index }).unwrap();
        let twice = transition(&once.new_state, &ctx, Event::ToggleFollowUp { index }).unwrap();

        prop_assert_ne!(&once.new_state, &state);
        prop_assert_eq!(&twice.new_state, &state);
    }

    // Invariant 4: Final request never repeats an initial symptom
    #[test]
    fn prop_final_request_has_no_duplicates(state in arb_initial_ready_state()) {
        if let Ok(result) = transition(&state, &test_context(), Event::submit_follow_up()) {
            for effect in &result.effects {
                if let Effect::RequestFinalAnalysis { request, .. } = effect {
                    let all = request.all_symptoms();
                    prop_assert_eq!(
                        all.len(),
                        request.initial_symptoms.len() + request.follow_up_symptoms.len()
                    );
                    prop_assert!(request
                        .follow_up_symptoms
                        .iter()
                        .all(|s| !request.initial_symptoms.contains(s)));
                }
            }
        } else {
            prop_assert!(state.selected_follow_up().is_empty());
        }
    }

    // Invariant 5: Reset from any state clears everything
    #[test]
    fn prop_reset_clears_everything(state in arb_state()) {
        let result = transition(&state, &test_context(), Event::Reset).unwrap();
        let new_state = result.new_state;

        prop_assert_eq!(&new_state, &SessionState::Idle);
        prop_assert!(new_state.initial_symptoms().is_empty());
        prop_assert!(new_state.follow_up_questions().is_empty());
        prop_assert!(new_state.selected_follow_up().is_empty());
        prop_assert!(new_state.condition_scores().is_empty());
        prop_assert!(new_state.condition_details().is_empty());
    }

    // Invariant 6: An engine failure for the pending request always lands in Error
    // without any partial results
    #[test]
    fn prop_engine_failure_keeps_no_partial_data(state in arb_state(), error in arb_engine_error()) {
        if let Some((stage, request_id)) = state.pending_request() {
            let event = Event::AnalysisFailed {
                stage,
                request_id: request_id.to_string(),
                error: error.clone(),
            };
            let result = transition(&state, &test_context(), event).unwrap();
            let new_state = result.new_state;

            prop_assert_eq!(new_state.phase(), Phase::Error);
            prop_assert_eq!(new_state.error_message(), Some(error.message.as_str()));
            prop_assert!(new_state.condition_scores().is_empty());
            prop_assert!(new_state.condition_details().is_empty());
            prop_assert!(result.effects.contains(&Effect::notify_error(error.message)));
        }
    }

    // Invariant 7: Blank text is a validation error, never a state change
    #[test]
    fn prop_blank_text_rejected(text in "[ \t\n]{0,10}") {
        let result = transition(&SessionState::Idle, &test_context(), Event::submit_symptoms(text));
        prop_assert!(matches!(result, Err(TransitionError::Validation(_))));
    }

    // Invariant 8: Requests are rejected while an engine call is in flight
    #[test]
    fn prop_awaiting_rejects_requests(state in arb_state(), text in "[a-z]{1,10}", index in 0usize..8) {
        if state.is_awaiting() {
            for event in [
                Event::submit_symptoms(text.clone()),
                Event::ToggleFollowUp { index },
                Event::submit_follow_up(),
            ] {
                let result = transition(&state, &test_context(), event);
                prop_assert!(
                    matches!(result, Err(TransitionError::InvalidState { .. })),
                    "Awaiting state accepted a request: {:?}",
                    result
                );
            }
        }
    }

    // Invariant 9: Results carrying another request id are stale
    #[test]
    fn prop_mismatched_result_is_stale(state in arb_state(), analysis in arb_initial_analysis()) {
        if let Some((AnalysisStage::Initial, pending)) = state.pending_request() {
            let event = Event::InitialAnalysisComplete {
                request_id: format!("{pending}-old"),
                analysis,
            };
            let result = transition(&state, &test_context(), event);
            let stale = matches!(result, Err(TransitionError::StaleResult { .. }));
            prop_assert!(stale, "expected StaleResult, got {:?}", result);
        }
    }
}
