//! Session runtime executor

use super::{SessionCommand, SseEvent};

use crate::coordinator::AnalysisCoordinator;
use crate::report::{FinalReport, SessionView};
use crate::state_machine::{
    transition, AnalysisStage, Effect, Event, SessionContext, SessionState, TransitionError,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Owns one session's state and executes the effects of its transitions
pub struct SessionRuntime {
    context: SessionContext,
    state: SessionState,
    updated_at: DateTime<Utc>,
    coordinator: AnalysisCoordinator,
    command_rx: mpsc::Receiver<SessionCommand>,
    /// Engine results are fed back through this sender
    command_tx: mpsc::Sender<SessionCommand>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    cancel: CancellationToken,
    /// The task stops once no command has arrived for this long
    idle_timeout: Duration,
    last_activity: Instant,
}

impl SessionRuntime {
    pub fn new(
        context: SessionContext,
        state: SessionState,
        coordinator: AnalysisCoordinator,
        command_rx: mpsc::Receiver<SessionCommand>,
        command_tx: mpsc::Sender<SessionCommand>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        cancel: CancellationToken,
        idle_timeout: Duration,
    ) -> Self {
        let updated_at = context.created_at;
        Self {
            context,
            state,
            updated_at,
            coordinator,
            command_rx,
            command_tx,
            broadcast_tx,
            cancel,
            idle_timeout,
            last_activity: Instant::now(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView::new(&self.context, &self.state, self.updated_at)
    }

    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.context.session_id,
            engine = %self.coordinator.engine_name(),
            "Starting session runtime"
        );

        loop {
            let idle_deadline = self.last_activity + self.idle_timeout;

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    if self.state.is_awaiting() {
                        tracing::info!(
                            session_id = %self.context.session_id,
                            phase = %self.state.phase(),
                            "Session destroyed with an engine call in flight"
                        );
                    }
                    break;
                }

                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        self.last_activity = Instant::now();
                        self.handle_command(command);
                    }
                    None => break,
                },

                () = tokio::time::sleep_until(idle_deadline) => {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        phase = %self.state.phase(),
                        idle_secs = self.idle_timeout.as_secs(),
                        "Session expired after inactivity"
                    );
                    break;
                }
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Dispatch { event, reply } => {
                let is_engine_result = event.is_engine_result();
                let result_request_id = event.result_request_id().map(str::to_string);
                let result = self.process_event(event);

                match (reply, result) {
                    (Some(reply), result) => {
                        let _ = reply.send(result.map(|()| self.view()));
                    }
                    (None, Err(e)) if is_engine_result => {
                        // Result of a call that was superseded by reset or resubmission
                        tracing::debug!(
                            session_id = %self.context.session_id,
                            phase = %self.state.phase(),
                            request_id = ?result_request_id,
                            error = %e,
                            "Dropping engine result"
                        );
                    }
                    (None, Err(e)) => {
                        tracing::warn!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Event rejected"
                        );
                    }
                    (None, Ok(())) => {}
                }
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.view());
            }
            SessionCommand::Report { reply } => {
                let report = FinalReport::from_state(&self.context, &self.state).ok_or(
                    TransitionError::InvalidState {
                        phase: self.state.phase(),
                        operation: "view the report",
                    },
                );
                let _ = reply.send(report);
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, &self.context, event)?;

        let from = self.state.phase();
        self.state = result.new_state;
        self.updated_at = Utc::now();
        tracing::debug!(
            session_id = %self.context.session_id,
            from = %from,
            phase = %self.state.phase(),
            "State transition"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::RequestInitialAnalysis { request_id, text } => {
                let coordinator = self.coordinator.clone();
                let command_tx = self.command_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(session_id = %session_id, "Requesting initial analysis (background)");
                    let event = match coordinator.run_initial_analysis(&text).await {
                        Ok(analysis) => Event::InitialAnalysisComplete {
                            request_id,
                            analysis,
                        },
                        Err(error) => Event::AnalysisFailed {
                            stage: AnalysisStage::Initial,
                            request_id,
                            error,
                        },
                    };
                    feed_back(&command_tx, &session_id, event).await;
                });
            }

            Effect::RequestFinalAnalysis {
                request_id,
                request,
            } => {
                let coordinator = self.coordinator.clone();
                let command_tx = self.command_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(
                        session_id = %session_id,
                        symptoms = request.all_symptoms().len(),
                        "Requesting final analysis (background)"
                    );
                    let result = coordinator
                        .run_final_analysis(&request.initial_symptoms, &request.follow_up_symptoms)
                        .await;
                    let event = match result {
                        Ok(analysis) => Event::FinalAnalysisComplete {
                            request_id,
                            analysis,
                        },
                        Err(error) => Event::AnalysisFailed {
                            stage: AnalysisStage::Final,
                            request_id,
                            error,
                        },
                    };
                    feed_back(&command_tx, &session_id, event).await;
                });
            }

            Effect::BroadcastState => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    session: self.view(),
                });
            }

            Effect::NotifyError { message } => {
                tracing::error!(
                    session_id = %self.context.session_id,
                    error = %message,
                    "Analysis failed"
                );
                let _ = self.broadcast_tx.send(SseEvent::Error { message });
            }
        }
    }
}

async fn feed_back(command_tx: &mpsc::Sender<SessionCommand>, session_id: &str, event: Event) {
    let command = SessionCommand::Dispatch { event, reply: None };
    if command_tx.send(command).await.is_err() {
        tracing::debug!(session_id = %session_id, "Session gone, dropping engine result");
    }
}
