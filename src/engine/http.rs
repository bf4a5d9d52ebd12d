//! Remote inference engine reached over HTTP

use super::types::{
    EngineEnvelope, FinalAnalysis, FinalAnalysisRequest, InitialAnalysis, InitialAnalysisRequest,
};
use super::{EngineError, InferenceEngine};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const ANALYZE_PATH: &str = "/analyze";
const FINAL_ANALYSIS_PATH: &str = "/final_analysis";

/// Longest slice of a response body quoted in error messages
const MAX_BODY_IN_ERROR: usize = 200;

/// HTTP engine implementation
pub struct HttpInferenceEngine {
    client: Client,
    base_url: String,
}

impl HttpInferenceEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, EngineError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !status.is_success() {
            return Err(EngineError::http_status(format!(
                "HTTP {status}: {}",
                truncate(&body)
            )));
        }

        let envelope: EngineEnvelope<Resp> = serde_json::from_str(&body).map_err(|e| {
            EngineError::malformed(format!(
                "Failed to parse response: {e} - body: {}",
                truncate(&body)
            ))
        })?;

        envelope.into_result()
    }
}

#[async_trait]
impl InferenceEngine for HttpInferenceEngine {
    async fn analyze(
        &self,
        request: &InitialAnalysisRequest,
    ) -> Result<InitialAnalysis, EngineError> {
        self.post(ANALYZE_PATH, request).await
    }

    async fn analyze_final(
        &self,
        request: &FinalAnalysisRequest,
    ) -> Result<FinalAnalysis, EngineError> {
        self.post(FINAL_ANALYSIS_PATH, request).await
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

fn classify_transport_error(e: &reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::timeout(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        EngineError::transport(format!("Connection failed: {e}"))
    } else {
        EngineError::transport(format!("Request failed: {e}"))
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_IN_ERROR {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_BODY_IN_ERROR).collect();
        format!("{head}...")
    }
}
