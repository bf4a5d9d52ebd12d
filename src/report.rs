//! Rendering of session snapshots and the final risk report

use crate::engine::{ConditionDetail, ConditionDetails, EngineErrorKind, SymptomSet};
use crate::state_machine::{AnalysisStage, Phase, SessionContext, SessionState};
use chrono::{DateTime, Utc};
use serde::Serialize;

const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN_SEVERITY: &str = "Unknown";
const NONE_LISTED: &str = "None listed";

/// Score as a percentage with one decimal place, e.g. `0.62` -> `"62.0%"`
pub fn format_percentage(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

// ============================================================================
// Session snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCondition {
    pub condition: String,
    pub score: f64,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpView {
    pub index: usize,
    pub question: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub stage: AnalysisStage,
    pub kind: EngineErrorKind,
    pub message: String,
}

/// Everything a client needs to render the current session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub initial_symptoms: SymptomSet,
    pub conditions: Vec<RankedCondition>,
    pub follow_up_questions: Vec<FollowUpView>,
    pub selected_follow_up: SymptomSet,
    pub condition_details: ConditionDetails,
    pub error: Option<ErrorView>,
}

impl SessionView {
    pub fn new(context: &SessionContext, state: &SessionState, updated_at: DateTime<Utc>) -> Self {
        let selected = state.selected_indices();
        let follow_up_questions = state
            .follow_up_questions()
            .iter()
            .enumerate()
            .map(|(index, question)| FollowUpView {
                index,
                question: question.clone(),
                selected: selected.is_some_and(|s| s.contains(&index)),
            })
            .collect();

        let error = match state {
            SessionState::Error {
                stage,
                message,
                error_kind,
            } => Some(ErrorView {
                stage: *stage,
                kind: *error_kind,
                message: message.clone(),
            }),
            _ => None,
        };

        Self {
            session_id: context.session_id.clone(),
            phase: state.phase(),
            created_at: context.created_at,
            updated_at,
            initial_symptoms: state.initial_symptoms().clone(),
            conditions: state
                .condition_scores()
                .ranked()
                .into_iter()
                .map(|(condition, score)| RankedCondition {
                    condition: condition.to_string(),
                    score,
                    percentage: format_percentage(score),
                })
                .collect(),
            follow_up_questions,
            selected_follow_up: state.selected_follow_up(),
            condition_details: state.condition_details().clone(),
            error,
        }
    }
}

// ============================================================================
// Final report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            RiskLevel::High => {
                "Please take your symptoms seriously and seek medical attention."
            }
            RiskLevel::Medium => {
                "Monitor your symptoms closely and consider consulting a healthcare provider."
            }
            RiskLevel::Low => "Remember to take care of yourself and get plenty of rest.",
        }
    }

    /// Two general self-care tips shown under the guidance line
    pub fn health_tips(self) -> [&'static str; 2] {
        match self {
            RiskLevel::High => [HYDRATION_TIP, SLEEP_TIP],
            RiskLevel::Medium => [SLEEP_TIP, STRESS_TIP],
            RiskLevel::Low => [DIET_TIP, ACTIVITY_TIP],
        }
    }
}

const HYDRATION_TIP: &str = "Stay hydrated by drinking plenty of water.";
const SLEEP_TIP: &str = "Get adequate sleep to help your body recover.";
const DIET_TIP: &str = "Maintain a balanced diet with plenty of fruits and vegetables.";
const STRESS_TIP: &str = "Practice stress-reduction techniques like deep breathing.";
const ACTIVITY_TIP: &str = "Stay active with light exercise when possible.";

/// One rendered condition, placeholders already applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionCard {
    pub condition: String,
    /// e.g. `"FLU (62.0% Risk)"`
    pub heading: String,
    pub score: f64,
    pub percentage: String,
    pub description: String,
    pub common_causes: String,
    pub risk_factors: String,
    pub severity: String,
}

impl ConditionCard {
    fn new(condition: &str, score: f64, detail: Option<&ConditionDetail>) -> Self {
        let percentage = format_percentage(score);
        let detail = detail.cloned().unwrap_or_default();

        Self {
            condition: condition.to_string(),
            heading: format!("{} ({percentage} Risk)", condition.to_uppercase()),
            score,
            percentage,
            description: detail
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            common_causes: join_or_placeholder(&detail.common_causes),
            risk_factors: join_or_placeholder(&detail.risk_factors),
            severity: detail
                .severity
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SEVERITY.to_string()),
        }
    }
}

fn join_or_placeholder(items: &[String]) -> String {
    if items.is_empty() {
        NONE_LISTED.to_string()
    } else {
        items.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub session_id: String,
    pub symptoms: SymptomSet,
    pub risk_level: RiskLevel,
    pub guidance: String,
    pub health_tips: Vec<String>,
    pub top_condition: Option<String>,
    pub conditions: Vec<ConditionCard>,
}

impl FinalReport {
    /// Build the report; `None` unless the session is in `FinalReady`
    pub fn from_state(context: &SessionContext, state: &SessionState) -> Option<Self> {
        if state.phase() != Phase::FinalReady {
            return None;
        }

        let scores = state.condition_scores();
        let details = state.condition_details();
        let top = scores.top();
        let risk_level = RiskLevel::from_score(top.map_or(0.0, |(_, score)| score));

        Some(Self {
            session_id: context.session_id.clone(),
            symptoms: state.all_symptoms(),
            risk_level,
            guidance: risk_level.guidance().to_string(),
            health_tips: risk_level.health_tips().map(str::to_string).to_vec(),
            top_condition: top.map(|(name, _)| name.to_string()),
            conditions: scores
                .ranked()
                .into_iter()
                .map(|(name, score)| ConditionCard::new(name, score, details.get(name)))
                .collect(),
        })
    }
}
