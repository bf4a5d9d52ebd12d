//! API request and response types

use serde::{Deserialize, Serialize};

/// Body of `POST /api/sessions/:id/symptoms`
#[derive(Debug, Deserialize)]
pub struct SubmitSymptomsRequest {
    pub symptoms: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
