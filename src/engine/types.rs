//! Data shapes exchanged with the inference engine

use super::EngineError;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A reported or detected symptom
pub type Symptom = String;

// ============================================================================
// Symptom sets
// ============================================================================

/// Symptoms unique by exact text, kept in first-seen order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Symptom>", into = "Vec<Symptom>")]
pub struct SymptomSet(Vec<Symptom>);

impl SymptomSet {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a symptom; returns false if it was already present
    pub fn insert(&mut self, symptom: impl Into<Symptom>) -> bool {
        let symptom = symptom.into();
        if self.contains(&symptom) {
            return false;
        }
        self.0.push(symptom);
        true
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.0.iter().any(|s| s == symptom)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symptom> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Symptom] {
        &self.0
    }

    /// Symptoms of `self` followed by those of `other` not already present
    pub fn union(&self, other: &SymptomSet) -> SymptomSet {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Symptoms of `self` that are not in `other`
    pub fn difference(&self, other: &SymptomSet) -> SymptomSet {
        self.iter()
            .filter(|s| !other.contains(s))
            .cloned()
            .collect()
    }
}

impl From<Vec<Symptom>> for SymptomSet {
    fn from(symptoms: Vec<Symptom>) -> Self {
        symptoms.into_iter().collect()
    }
}

impl From<SymptomSet> for Vec<Symptom> {
    fn from(set: SymptomSet) -> Self {
        set.0
    }
}

impl<S: Into<Symptom>> FromIterator<S> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SymptomSet::new();
        for symptom in iter {
            set.insert(symptom);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SymptomSet {
    type Item = &'a Symptom;
    type IntoIter = std::slice::Iter<'a, Symptom>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Condition scores
// ============================================================================

/// Condition name to confidence in [0.0, 1.0]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionScores(BTreeMap<String, f64>);

impl ConditionScores {
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, condition: impl Into<String>, score: f64) {
        self.0.insert(condition.into(), score);
    }

    pub fn get(&self, condition: &str) -> Option<f64> {
        self.0.get(condition).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Check every score is a finite value in [0, 1]
    pub fn validate(&self) -> Result<(), EngineError> {
        match self
            .0
            .iter()
            .find(|(_, score)| !(0.0..=1.0).contains(*score))
        {
            Some((name, score)) => Err(EngineError::malformed(format!(
                "Score for '{name}' is outside [0, 1]: {score}"
            ))),
            None => Ok(()),
        }
    }

    /// Descending by score, ties broken by name
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| rank_order(*a, *b));
        ranked
    }

    /// Highest-ranked condition
    pub fn top(&self) -> Option<(&str, f64)> {
        self.iter().min_by(|a, b| rank_order(*a, *b))
    }
}

fn rank_order(a: (&str, f64), b: (&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

impl<S: Into<String>> FromIterator<(S, f64)> for ConditionScores {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ============================================================================
// Condition details
// ============================================================================

/// Per-condition record attached to a final analysis. Every field is optional
/// on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub common_causes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

pub type ConditionDetails = BTreeMap<String, ConditionDetail>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Requests and results
// ============================================================================

/// Body of the initial analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialAnalysisRequest {
    pub symptoms: String,
}

/// Body of the final analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnalysisRequest {
    #[serde(default)]
    pub initial_symptoms: SymptomSet,
    #[serde(default)]
    pub follow_up_symptoms: SymptomSet,
}

impl FinalAnalysisRequest {
    /// Build a request whose two lists never share an entry, so together they
    /// form `initial ∪ follow_up` without duplicates.
    pub fn new(initial_symptoms: SymptomSet, follow_up_symptoms: &SymptomSet) -> Self {
        let follow_up_symptoms = follow_up_symptoms.difference(&initial_symptoms);
        Self {
            initial_symptoms,
            follow_up_symptoms,
        }
    }

    pub fn all_symptoms(&self) -> SymptomSet {
        self.initial_symptoms.union(&self.follow_up_symptoms)
    }
}

/// Result of the initial analysis phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialAnalysis {
    pub detected_symptoms: SymptomSet,
    pub potential_conditions: ConditionScores,
    pub follow_up_questions: Vec<String>,
}

/// Result of the final analysis phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalAnalysis {
    pub potential_conditions: ConditionScores,
    #[serde(default, deserialize_with = "null_as_default")]
    pub condition_details: ConditionDetails,
}

// ============================================================================
// Wire envelope
// ============================================================================

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// `{ status, analysis }` wrapper used by both engine calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEnvelope<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> EngineEnvelope<T> {
    pub fn success(analysis: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            analysis: Some(analysis),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            analysis: None,
            message: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<T, EngineError> {
        if self.status != STATUS_SUCCESS {
            let detail = self
                .message
                .unwrap_or_else(|| "no message given".to_string());
            return Err(EngineError::rejected(format!(
                "Engine returned status '{}': {detail}",
                self.status
            )));
        }
        self.analysis
            .ok_or_else(|| EngineError::malformed("Engine response has no analysis"))
    }
}
