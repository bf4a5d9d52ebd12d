//! Runtime for analysis sessions
//!
//! Every session runs as its own tokio task that owns the [`SessionState`].
//! The [`SessionManager`] only keeps handles: a command channel into the
//! task, a broadcast channel out of it and a cancellation token.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::coordinator::AnalysisCoordinator;
use crate::report::{FinalReport, SessionView};
use crate::state_machine::{Event, SessionContext, SessionState, TransitionError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// Reply to a user command: the new snapshot, or why the command was refused
pub type DispatchReply = oneshot::Sender<Result<SessionView, TransitionError>>;

/// Messages accepted by a session task
#[derive(Debug)]
pub enum SessionCommand {
    /// Feed an event through the state machine. User commands carry a reply;
    /// engine results fed back by the runtime do not.
    Dispatch {
        event: Event,
        reply: Option<DispatchReply>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionView>,
    },
    Report {
        reply: oneshot::Sender<Result<FinalReport, TransitionError>>,
    },
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { session: SessionView },
    StateChange { session: SessionView },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Session {0} not found")]
    NotFound(String),
    #[error("Session {0} is no longer running")]
    Closed(String),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<SessionCommand>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    cancel: CancellationToken,
}

type SessionMap = Arc<RwLock<HashMap<String, SessionHandle>>>;

/// Manager for all session runtimes
pub struct SessionManager {
    coordinator: AnalysisCoordinator,
    /// Shared with the session tasks so an expired session removes itself
    sessions: SessionMap,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(coordinator: AnalysisCoordinator, idle_timeout: Duration) -> Self {
        Self {
            coordinator,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start a new session in `Idle` and return its first snapshot
    pub async fn create(&self) -> SessionView {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(&session_id);

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let cancel = CancellationToken::new();

        let runtime = SessionRuntime::new(
            context,
            SessionState::Idle,
            self.coordinator.clone(),
            command_rx,
            command_tx.clone(),
            broadcast_tx.clone(),
            cancel.clone(),
            self.idle_timeout,
        );
        let view = runtime.view();

        let id = session_id.clone();
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            runtime.run().await;
            // Already gone if the session was destroyed explicitly
            if sessions.write().await.remove(&id).is_some() {
                tracing::info!(session_id = %id, "Removed expired session");
            }
            tracing::info!(session_id = %id, "Session runtime finished");
        });

        let active = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id.clone(),
                SessionHandle {
                    command_tx,
                    broadcast_tx,
                    cancel,
                },
            );
            sessions.len()
        };

        tracing::info!(session_id = %session_id, active, "Created session");
        view
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Send an event and wait for the resulting snapshot
    pub async fn dispatch(&self, session_id: &str, event: Event) -> Result<SessionView, SessionError> {
        let handle = self.handle(session_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();

        handle
            .command_tx
            .send(SessionCommand::Dispatch {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))?;

        let result = reply_rx
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))?;
        Ok(result?)
    }

    pub async fn submit_symptoms(
        &self,
        session_id: &str,
        text: impl Into<String>,
    ) -> Result<SessionView, SessionError> {
        self.dispatch(session_id, Event::submit_symptoms(text)).await
    }

    pub async fn toggle_follow_up(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<SessionView, SessionError> {
        self.dispatch(session_id, Event::ToggleFollowUp { index })
            .await
    }

    pub async fn submit_follow_up(&self, session_id: &str) -> Result<SessionView, SessionError> {
        self.dispatch(session_id, Event::submit_follow_up()).await
    }

    pub async fn reset(&self, session_id: &str) -> Result<SessionView, SessionError> {
        self.dispatch(session_id, Event::Reset).await
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionView, SessionError> {
        let handle = self.handle(session_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))
    }

    pub async fn report(&self, session_id: &str) -> Result<FinalReport, SessionError> {
        let handle = self.handle(session_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(SessionCommand::Report { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))?;
        let result = reply_rx
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))?;
        Ok(result?)
    }

    /// Subscribe to session updates
    ///
    /// The receiver is created before the snapshot is taken, so no change
    /// between the two is lost.
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionView, broadcast::Receiver<SseEvent>), SessionError> {
        let handle = self.handle(session_id).await?;
        let rx = handle.broadcast_tx.subscribe();
        let view = self.snapshot(session_id).await?;
        Ok((view, rx))
    }

    /// Stop the session task; an in-flight engine result is dropped
    pub async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.cancel.cancel();
        tracing::info!(session_id = %session_id, "Destroyed session");
        Ok(())
    }
}
