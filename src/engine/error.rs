//! Inference engine error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine error with classification.
///
/// Every kind is treated the same way by the session: the analysis fails and
/// the session moves to its error phase. The kind only exists for diagnosis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }

    pub fn http_status(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::HttpStatus, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Rejected, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Malformed, message)
    }
}

/// Where an engine call went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// Request refused before it was sent (empty input)
    Validation,
    /// Connection or I/O failure
    Transport,
    /// No response within the configured timeout
    Timeout,
    /// Non-2xx HTTP status
    HttpStatus,
    /// Engine answered with a status other than "success"
    Rejected,
    /// Response body could not be decoded or violated the contract
    Malformed,
}

impl EngineErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::Rejected => "rejected",
            Self::Malformed => "malformed",
        }
    }
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
