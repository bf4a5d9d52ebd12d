//! In-process reference engine
//!
//! Detects known symptom phrases by whole-word matching and scores each
//! condition by the share of its symptoms that were found.

use super::knowledge::{self, CONDITIONS};
use super::types::{
    ConditionScores, FinalAnalysis, FinalAnalysisRequest, InitialAnalysis,
    InitialAnalysisRequest, SymptomSet,
};
use super::{EngineError, InferenceEngine};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

const MAX_FOLLOW_UP_QUESTIONS: usize = 5;

/// Keyword engine implementation
pub struct KeywordEngine {
    matchers: Vec<(&'static str, Regex)>,
}

impl KeywordEngine {
    pub fn new() -> Result<Self, EngineError> {
        let matchers = knowledge::vocabulary()
            .into_iter()
            .map(|phrase| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(phrase)))
                    .case_insensitive(true)
                    .build()
                    .map(|re| (phrase, re))
                    .map_err(|e| EngineError::validation(format!("Bad symptom pattern: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    /// Known symptoms mentioned in `text`, in order of first mention
    fn detect(&self, text: &str) -> SymptomSet {
        let mut found: Vec<(usize, &'static str)> = self
            .matchers
            .iter()
            .filter_map(|(phrase, re)| re.find(text).map(|m| (m.start(), *phrase)))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, phrase)| phrase).collect()
    }

    fn score(symptoms: &SymptomSet) -> ConditionScores {
        CONDITIONS
            .iter()
            .filter_map(|condition| {
                let matched = condition
                    .symptoms
                    .iter()
                    .filter(|s| symptoms.contains(s))
                    .count();
                if matched == 0 {
                    return None;
                }
                #[allow(clippy::cast_precision_loss)] // symptom lists are tiny
                let ratio = matched as f64 / condition.symptoms.len() as f64;
                Some((condition.name, (ratio * 100.0).round() / 100.0))
            })
            .collect()
    }

    fn follow_up_questions(scores: &ConditionScores) -> Vec<String> {
        let mut questions: Vec<String> = Vec::new();
        for (name, _) in scores.ranked() {
            let Some(condition) = knowledge::find(name) else {
                continue;
            };
            for probe in condition.probes {
                if questions.len() == MAX_FOLLOW_UP_QUESTIONS {
                    return questions;
                }
                if !questions.iter().any(|q| q == probe.question) {
                    questions.push(probe.question.to_string());
                }
            }
        }
        questions
    }
}

#[async_trait]
impl InferenceEngine for KeywordEngine {
    async fn analyze(
        &self,
        request: &InitialAnalysisRequest,
    ) -> Result<InitialAnalysis, EngineError> {
        let detected_symptoms = self.detect(&request.symptoms);
        let potential_conditions = Self::score(&detected_symptoms);
        let follow_up_questions = Self::follow_up_questions(&potential_conditions);

        Ok(InitialAnalysis {
            detected_symptoms,
            potential_conditions,
            follow_up_questions,
        })
    }

    async fn analyze_final(
        &self,
        request: &FinalAnalysisRequest,
    ) -> Result<FinalAnalysis, EngineError> {
        let all = request.all_symptoms();
        let joined = all.iter().map(String::as_str).collect::<Vec<_>>().join(" ");

        let mut symptoms = self.detect(&joined);
        for answered in &all {
            if let Some(symptom) = knowledge::probe_symptom(answered) {
                symptoms.insert(symptom);
            }
        }

        let potential_conditions = Self::score(&symptoms);
        let condition_details = potential_conditions
            .iter()
            .map(|(name, _)| {
                let detail = knowledge::find(name)
                    .map(knowledge::ConditionProfile::detail)
                    .unwrap_or_default();
                (name.to_string(), detail)
            })
            .collect();

        Ok(FinalAnalysis {
            potential_conditions,
            condition_details,
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
