//! Mock engines for testing
//!
//! These mocks enable runtime testing without real I/O.

use crate::engine::{
    EngineError, FinalAnalysis, FinalAnalysisRequest, InferenceEngine, InitialAnalysis,
    InitialAnalysisRequest,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Engine
// ============================================================================

/// Engine that returns queued responses and records every request
#[derive(Default)]
pub struct MockEngine {
    initial: Mutex<VecDeque<Result<InitialAnalysis, EngineError>>>,
    finals: Mutex<VecDeque<Result<FinalAnalysis, EngineError>>>,
    initial_requests: Mutex<Vec<InitialAnalysisRequest>>,
    final_requests: Mutex<Vec<FinalAnalysisRequest>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_initial(&self, response: Result<InitialAnalysis, EngineError>) {
        self.initial.lock().unwrap().push_back(response);
    }

    pub fn queue_final(&self, response: Result<FinalAnalysis, EngineError>) {
        self.finals.lock().unwrap().push_back(response);
    }

    pub fn initial_requests(&self) -> Vec<InitialAnalysisRequest> {
        self.initial_requests.lock().unwrap().clone()
    }

    pub fn final_requests(&self) -> Vec<FinalAnalysisRequest> {
        self.final_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceEngine for MockEngine {
    async fn analyze(&self, request: &InitialAnalysisRequest) -> Result<InitialAnalysis, EngineError> {
        self.initial_requests.lock().unwrap().push(request.clone());
        self.initial
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::transport("No mock response queued")))
    }

    async fn analyze_final(&self, request: &FinalAnalysisRequest) -> Result<FinalAnalysis, EngineError> {
        self.final_requests.lock().unwrap().push(request.clone());
        self.finals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::transport("No mock response queued")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Mock Engine (for in-flight testing)
// ============================================================================

/// Engine whose calls block until the test releases them
pub struct GatedMockEngine {
    inner: MockEngine,
    /// Notified when a call starts (for test synchronization)
    pub started: Arc<Notify>,
    /// Each `notify_one` lets one blocked call finish
    pub release: Arc<Notify>,
}

impl GatedMockEngine {
    pub fn new() -> Self {
        Self {
            inner: MockEngine::new(),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_initial(&self, response: Result<InitialAnalysis, EngineError>) {
        self.inner.queue_initial(response);
    }

    pub fn initial_requests(&self) -> Vec<InitialAnalysisRequest> {
        self.inner.initial_requests()
    }
}

#[async_trait]
impl InferenceEngine for GatedMockEngine {
    async fn analyze(&self, request: &InitialAnalysisRequest) -> Result<InitialAnalysis, EngineError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.analyze(request).await
    }

    async fn analyze_final(&self, request: &FinalAnalysisRequest) -> Result<FinalAnalysis, EngineError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.analyze_final(request).await
    }

    fn name(&self) -> &str {
        "gated-mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::AnalysisCoordinator;
    use crate::engine::{ConditionDetail, EngineErrorKind};
    use crate::report::{RiskLevel, SessionView};
    use crate::runtime::{SessionError, SessionManager, SseEvent};
    use crate::state_machine::{Phase, TransitionError};
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn headache_analysis() -> InitialAnalysis {
        InitialAnalysis {
            detected_symptoms: ["headache", "fever"].into_iter().collect(),
            potential_conditions: [("flu", 0.62), ("migraine", 0.21)].into_iter().collect(),
            follow_up_questions: vec![
                "Do you have a stiff neck?".to_string(),
                "Is the fever above 39°C?".to_string(),
            ],
        }
    }

    fn manager(engine: Arc<dyn InferenceEngine>) -> SessionManager {
        SessionManager::new(AnalysisCoordinator::new(engine), Duration::from_secs(60))
    }

    /// Wait for a broadcast snapshot in the given phase
    async fn wait_for_phase(rx: &mut broadcast::Receiver<SseEvent>, phase: Phase) -> SessionView {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Ok(SseEvent::StateChange { session })) if session.phase == phase => {
                    return session;
                }
                Ok(Ok(_)) => continue,
                other => panic!("Never reached {phase}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_engine_records_and_drains() {
        let engine = MockEngine::new();
        engine.queue_initial(Ok(headache_analysis()));

        let request = InitialAnalysisRequest {
            symptoms: "fever".to_string(),
        };
        assert!(engine.analyze(&request).await.is_ok());
        let err = engine.analyze(&request).await.unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::Transport);
        assert_eq!(engine.initial_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_headache_scenario_end_to_end() {
        let engine = Arc::new(MockEngine::new());
        engine.queue_initial(Ok(headache_analysis()));
        engine.queue_final(Ok(FinalAnalysis {
            potential_conditions: [("flu", 0.8), ("meningitis", 0.45)].into_iter().collect(),
            condition_details: [(
                "flu".to_string(),
                ConditionDetail {
                    description: Some("Viral infection".to_string()),
                    ..ConditionDetail::default()
                },
            )]
            .into_iter()
            .collect(),
        }));

        let sessions = manager(engine.clone());
        let id = sessions.create().await.session_id;
        let (init, mut rx) = sessions.subscribe(&id).await.unwrap();
        assert_eq!(init.phase, Phase::Idle);

        let view = sessions
            .submit_symptoms(&id, "I have a headache and fever")
            .await
            .unwrap();
        assert_eq!(view.phase, Phase::AwaitingInitial);

        let ready = wait_for_phase(&mut rx, Phase::InitialReady).await;
        assert_eq!(ready.initial_symptoms.as_slice(), ["headache", "fever"]);
        assert_eq!(ready.conditions[0].percentage, "62.0%");
        assert_eq!(ready.follow_up_questions.len(), 2);

        sessions.toggle_follow_up(&id, 0).await.unwrap();
        sessions.submit_follow_up(&id).await.unwrap();
        wait_for_phase(&mut rx, Phase::FinalReady).await;

        let requests = engine.final_requests();
        let sent = &requests[0];
        assert_eq!(sent.initial_symptoms.as_slice(), ["headache", "fever"]);
        assert_eq!(
            sent.follow_up_symptoms.as_slice(),
            ["Do you have a stiff neck?"]
        );

        let report = sessions.report(&id).await.unwrap();
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.conditions[0].heading, "FLU (80.0% Risk)");
        assert_eq!(report.conditions[1].description, "No description available");
    }

    #[tokio::test]
    async fn test_engine_failure_reaches_error_and_notifies() {
        let engine = Arc::new(MockEngine::new());
        engine.queue_initial(Err(EngineError::http_status("HTTP 503: unavailable")));

        let sessions = manager(engine);
        let id = sessions.create().await.session_id;
        let (_, mut rx) = sessions.subscribe(&id).await.unwrap();

        sessions.submit_symptoms(&id, "fever").await.unwrap();

        let mut error_message = None;
        let mut error_view = None;
        while error_message.is_none() || error_view.is_none() {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Ok(SseEvent::Error { message })) => error_message = Some(message),
                Ok(Ok(SseEvent::StateChange { session })) if session.phase == Phase::Error => {
                    error_view = Some(session);
                }
                Ok(Ok(_)) => {}
                other => panic!("Unexpected: {other:?}"),
            }
        }
        assert_eq!(error_message.as_deref(), Some("HTTP 503: unavailable"));

        let view = error_view.unwrap();
        assert!(view.conditions.is_empty());
        assert_eq!(view.error.unwrap().kind, EngineErrorKind::HttpStatus);

        // Recoverable by a fresh submission
        let view = sessions.submit_symptoms(&id, "cough").await.unwrap();
        assert_eq!(view.phase, Phase::AwaitingInitial);
    }

    #[tokio::test]
    async fn test_validation_errors_return_immediately() {
        let sessions = manager(Arc::new(MockEngine::new()));
        let id = sessions.create().await.session_id;

        let err = sessions.submit_symptoms(&id, "   ").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::Validation(_))
        ));
        assert_eq!(sessions.snapshot(&id).await.unwrap().phase, Phase::Idle);

        let err = sessions.toggle_follow_up(&id, 0).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::InvalidState { .. })
        ));

        let err = sessions.report(&id).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::InvalidState {
                phase: Phase::Idle,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_double_submit_rejected_while_in_flight() {
        let engine = Arc::new(GatedMockEngine::new());
        engine.queue_initial(Ok(headache_analysis()));
        let started = engine.started.clone();
        let release = engine.release.clone();

        let sessions = manager(engine.clone());
        let id = sessions.create().await.session_id;
        let (_, mut rx) = sessions.subscribe(&id).await.unwrap();

        sessions.submit_symptoms(&id, "headache").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("engine call should start");

        let err = sessions.submit_symptoms(&id, "fever").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::InvalidState {
                phase: Phase::AwaitingInitial,
                ..
            })
        ));

        release.notify_one();
        wait_for_phase(&mut rx, Phase::InitialReady).await;
        assert_eq!(engine.initial_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_result_after_reset_is_dropped() {
        let engine = Arc::new(GatedMockEngine::new());
        engine.queue_initial(Ok(headache_analysis()));
        let started = engine.started.clone();
        let release = engine.release.clone();

        let sessions = manager(engine);
        let id = sessions.create().await.session_id;

        sessions.submit_symptoms(&id, "headache").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("engine call should start");

        let view = sessions.reset(&id).await.unwrap();
        assert_eq!(view.phase, Phase::Idle);

        release.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let view = sessions.snapshot(&id).await.unwrap();
        assert_eq!(view.phase, Phase::Idle);
        assert!(view.conditions.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_removes_session() {
        let sessions = manager(Arc::new(MockEngine::new()));
        let id = sessions.create().await.session_id;
        assert!(sessions.snapshot(&id).await.is_ok());

        sessions.destroy(&id).await.unwrap();

        assert!(matches!(
            sessions.snapshot(&id).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            sessions.destroy(&id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let engine: Arc<dyn InferenceEngine> = Arc::new(MockEngine::new());
        let sessions = SessionManager::new(AnalysisCoordinator::new(engine), Duration::from_millis(50));
        let id = sessions.create().await.session_id;

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(matches!(
            sessions.snapshot(&id).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            sessions.destroy(&id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let engine: Arc<dyn InferenceEngine> = Arc::new(MockEngine::new());
        let sessions = SessionManager::new(AnalysisCoordinator::new(engine), Duration::from_millis(300));
        let id = sessions.create().await.session_id;

        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(sessions.snapshot(&id).await.unwrap().phase, Phase::Idle);
        }
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let engine = Arc::new(MockEngine::new());
        engine.queue_initial(Ok(headache_analysis()));

        let sessions = manager(engine);
        let a = sessions.create().await.session_id;
        let b = sessions.create().await.session_id;
        let (_, mut rx) = sessions.subscribe(&a).await.unwrap();

        sessions.submit_symptoms(&a, "headache").await.unwrap();
        wait_for_phase(&mut rx, Phase::InitialReady).await;

        assert_eq!(sessions.snapshot(&b).await.unwrap().phase, Phase::Idle);
    }
}
