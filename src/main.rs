//! Symptom triage service
//!
//! Guides a user from free-text symptoms through follow-up questions to a
//! final risk report, backed by a pluggable inference engine.

mod api;
mod config;
mod coordinator;
mod engine;
mod report;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::ServiceConfig;
use engine::{build_engine, InferenceEngine, KeywordEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symptom_triage=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServiceConfig::from_env();

    // Sessions talk to the configured engine; the wire endpoints always
    // serve the in-process one
    let session_engine = build_engine(&config.engine)?;
    let local_engine: Arc<dyn InferenceEngine> = Arc::new(KeywordEngine::new()?);

    match &config.engine.url {
        Some(url) => tracing::info!(
            url = %url,
            timeout_secs = config.engine.timeout.as_secs(),
            "Using remote inference engine"
        ),
        None => tracing::info!("No TRIAGE_ENGINE_URL set, using in-process keyword engine"),
    }

    // Create application state
    let state = AppState::new(session_engine, local_engine, config.session_idle_timeout);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Symptom triage server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
