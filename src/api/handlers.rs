//! HTTP request handlers

use super::error::ApiError;
use super::sse::sse_stream;
use super::types::{SubmitSymptomsRequest, SuccessResponse};
use super::AppState;
use crate::engine::{
    EngineEnvelope, FinalAnalysis, FinalAnalysisRequest, InitialAnalysis, InitialAnalysisRequest,
};
use crate::report::{FinalReport, SessionView};
use crate::runtime::SseEvent;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/symptoms", post(submit_symptoms))
        .route("/api/sessions/:id/follow-up/submit", post(submit_follow_up))
        .route("/api/sessions/:id/follow-up/:index", post(toggle_follow_up))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/report", get(get_report))
        // Engine wire endpoints
        .route("/analyze", post(analyze))
        .route("/final_analysis", post(final_analysis))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create().await;
    (StatusCode::CREATED, Json(view))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.sessions.destroy(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, broadcast_rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(SseEvent::Init { session }, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn submit_symptoms(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitSymptomsRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.submit_symptoms(&id, req.symptoms).await?))
}

async fn toggle_follow_up(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.toggle_follow_up(&id, index).await?))
}

async fn submit_follow_up(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.submit_follow_up(&id).await?))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.reset(&id).await?))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FinalReport>, ApiError> {
    Ok(Json(state.sessions.report(&id).await?))
}

// ============================================================
// Engine Wire Endpoints
// ============================================================

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<InitialAnalysisRequest>,
) -> Response {
    if req.symptoms.trim().is_empty() {
        return engine_failure::<InitialAnalysis>("No symptoms provided".to_string());
    }
    match state.local_engine.analyze(&req).await {
        Ok(analysis) => Json(EngineEnvelope::success(analysis)).into_response(),
        Err(e) => engine_failure::<InitialAnalysis>(e.message),
    }
}

async fn final_analysis(
    State(state): State<AppState>,
    Json(req): Json<FinalAnalysisRequest>,
) -> Response {
    if req.all_symptoms().is_empty() {
        return engine_failure::<FinalAnalysis>("No symptoms provided".to_string());
    }
    match state.local_engine.analyze_final(&req).await {
        Ok(analysis) => Json(EngineEnvelope::success(analysis)).into_response(),
        Err(e) => engine_failure::<FinalAnalysis>(e.message),
    }
}

fn engine_failure<T: serde::Serialize>(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(EngineEnvelope::<T>::error(message)),
    )
        .into_response()
}

async fn get_version() -> &'static str {
    concat!("symptom_triage ", env!("CARGO_PKG_VERSION"))
}
