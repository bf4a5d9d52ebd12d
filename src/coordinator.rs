//! Analysis request coordinator
//!
//! Builds the outbound request for each phase, validates what comes back and
//! turns every failure into an [`EngineError`]. Holds no session state and
//! never retries; a retry is the user submitting again.

use crate::engine::{
    EngineError, FinalAnalysis, FinalAnalysisRequest, InferenceEngine, InitialAnalysis,
    InitialAnalysisRequest, SymptomSet,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AnalysisCoordinator {
    engine: Arc<dyn InferenceEngine>,
}

impl AnalysisCoordinator {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn run_initial_analysis(
        &self,
        free_text: &str,
    ) -> Result<InitialAnalysis, EngineError> {
        let symptoms = free_text.trim();
        if symptoms.is_empty() {
            return Err(EngineError::validation("Symptom text is empty"));
        }

        let request = InitialAnalysisRequest {
            symptoms: symptoms.to_string(),
        };
        let analysis = self.engine.analyze(&request).await?;
        analysis.potential_conditions.validate()?;
        Ok(analysis)
    }

    pub async fn run_final_analysis(
        &self,
        initial_symptoms: &SymptomSet,
        follow_up_symptoms: &SymptomSet,
    ) -> Result<FinalAnalysis, EngineError> {
        let request = FinalAnalysisRequest::new(initial_symptoms.clone(), follow_up_symptoms);
        if request.all_symptoms().is_empty() {
            return Err(EngineError::validation(
                "Final analysis needs at least one symptom",
            ));
        }

        let analysis = self.engine.analyze_final(&request).await?;
        analysis.potential_conditions.validate()?;
        Ok(analysis)
    }
}
