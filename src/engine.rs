//! Inference engine abstraction
//!
//! The engine detects symptoms and scores conditions. It is opaque to the
//! rest of the service and only reached through [`InferenceEngine`].

mod error;
mod http;
mod keyword;
mod knowledge;
mod types;

pub use error::{EngineError, EngineErrorKind};
pub use http::HttpInferenceEngine;
pub use keyword::KeywordEngine;
pub use types::*;

use crate::config::EngineConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for inference engines
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Detect symptoms in free text and propose follow-up questions
    async fn analyze(
        &self,
        request: &InitialAnalysisRequest,
    ) -> Result<InitialAnalysis, EngineError>;

    /// Score conditions for a refined symptom set and attach details
    async fn analyze_final(
        &self,
        request: &FinalAnalysisRequest,
    ) -> Result<FinalAnalysis, EngineError>;

    /// Engine name for logs
    fn name(&self) -> &str;
}

/// Build the engine described by the configuration: a remote HTTP engine when
/// a URL is set, otherwise the in-process keyword engine.
pub fn build_engine(config: &EngineConfig) -> Result<Arc<dyn InferenceEngine>, EngineError> {
    let engine: Arc<dyn InferenceEngine> = match &config.url {
        Some(url) => Arc::new(HttpInferenceEngine::new(url, config.timeout)?),
        None => Arc::new(KeywordEngine::new()?),
    };
    Ok(Arc::new(LoggingEngine::new(engine)))
}

/// Logging wrapper for inference engines
pub struct LoggingEngine {
    inner: Arc<dyn InferenceEngine>,
    name: String,
}

impl LoggingEngine {
    pub fn new(inner: Arc<dyn InferenceEngine>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }

    fn log_outcome<T>(&self, call: &str, started: std::time::Instant, result: &Result<T, EngineError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    engine = %self.name,
                    call,
                    duration_ms = %duration.as_millis(),
                    "Engine call completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    engine = %self.name,
                    call,
                    duration_ms = %duration.as_millis(),
                    kind = %e.kind,
                    error = %e.message,
                    "Engine call failed"
                );
            }
        }
    }
}

#[async_trait]
impl InferenceEngine for LoggingEngine {
    async fn analyze(
        &self,
        request: &InitialAnalysisRequest,
    ) -> Result<InitialAnalysis, EngineError> {
        let start = std::time::Instant::now();
        let result = self.inner.analyze(request).await;
        self.log_outcome("analyze", start, &result);
        result
    }

    async fn analyze_final(
        &self,
        request: &FinalAnalysisRequest,
    ) -> Result<FinalAnalysis, EngineError> {
        let start = std::time::Instant::now();
        let result = self.inner.analyze_final(request).await;
        self.log_outcome("final_analysis", start, &result);
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
