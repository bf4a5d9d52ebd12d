//! Built-in condition knowledge base for the keyword engine

use super::ConditionDetail;

/// A follow-up question and the symptom a "yes" adds to the analysis
pub struct FollowUpProbe {
    pub question: &'static str,
    pub symptom: &'static str,
}

/// Everything the keyword engine knows about one condition
pub struct ConditionProfile {
    pub name: &'static str,
    pub symptoms: &'static [&'static str],
    pub probes: &'static [FollowUpProbe],
    pub description: &'static str,
    pub common_causes: &'static [&'static str],
    pub risk_factors: &'static [&'static str],
    pub severity: &'static str,
}

impl ConditionProfile {
    pub fn detail(&self) -> ConditionDetail {
        ConditionDetail {
            description: Some(self.description.to_string()),
            common_causes: to_strings(self.common_causes),
            risk_factors: to_strings(self.risk_factors),
            severity: Some(self.severity.to_string()),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub static CONDITIONS: &[ConditionProfile] = &[
    ConditionProfile {
        name: "food poisoning",
        symptoms: &[
            "nausea",
            "vomiting",
            "diarrhea",
            "stomach pain",
            "fever",
            "recent unusual food",
        ],
        probes: &[
            FollowUpProbe {
                question: "Have you eaten anything unusual in the last 48 hours?",
                symptom: "recent unusual food",
            },
            FollowUpProbe {
                question: "Are you having stomach cramps?",
                symptom: "stomach pain",
            },
        ],
        description: "Illness caused by eating contaminated food",
        common_causes: &["Bacteria", "Viruses", "Parasites", "Toxins"],
        risk_factors: &[
            "Eating raw/undercooked food",
            "Poor hygiene",
            "Contaminated water",
        ],
        severity: "Moderate to High",
    },
    ConditionProfile {
        name: "diabetes",
        symptoms: &[
            "frequent urination",
            "excessive thirst",
            "fatigue",
            "blurred vision",
            "weight loss",
        ],
        probes: &[
            FollowUpProbe {
                question: "Are you unusually thirsty?",
                symptom: "excessive thirst",
            },
            FollowUpProbe {
                question: "Do you urinate more often than usual?",
                symptom: "frequent urination",
            },
        ],
        description: "Chronic condition affecting blood sugar regulation",
        common_causes: &[
            "Insulin resistance",
            "Autoimmune response",
            "Genetic factors",
        ],
        risk_factors: &["Obesity", "Family history", "Sedentary lifestyle"],
        severity: "High",
    },
    ConditionProfile {
        name: "high cholesterol",
        symptoms: &["chest pain", "shortness of breath", "numbness", "fatigue"],
        probes: &[FollowUpProbe {
            question: "Do you feel pain or pressure in your chest?",
            symptom: "chest pain",
        }],
        description: "High levels of cholesterol in the blood",
        common_causes: &["Poor diet", "Lack of exercise", "Genetic factors"],
        risk_factors: &["Obesity", "Smoking", "High blood pressure"],
        severity: "Moderate to High",
    },
    ConditionProfile {
        name: "flu",
        symptoms: &[
            "fever",
            "cough",
            "sore throat",
            "body aches",
            "headache",
            "fatigue",
            "chills",
        ],
        probes: &[
            FollowUpProbe {
                question: "Do you have chills?",
                symptom: "chills",
            },
            FollowUpProbe {
                question: "Do you have a cough?",
                symptom: "cough",
            },
            FollowUpProbe {
                question: "Are your muscles aching?",
                symptom: "body aches",
            },
        ],
        description: "Influenza viral infection",
        common_causes: &["Influenza viruses"],
        risk_factors: &["Weakened immune system", "Age", "Chronic conditions"],
        severity: "Moderate",
    },
    ConditionProfile {
        name: "anxiety",
        symptoms: &[
            "restlessness",
            "rapid heartbeat",
            "sweating",
            "insomnia",
            "shortness of breath",
        ],
        probes: &[
            FollowUpProbe {
                question: "Do you feel restless or on edge?",
                symptom: "restlessness",
            },
            FollowUpProbe {
                question: "Do you have trouble sleeping?",
                symptom: "insomnia",
            },
        ],
        description: "Mental health condition characterized by excessive worry",
        common_causes: &[
            "Genetic factors",
            "Brain chemistry",
            "Environmental stress",
        ],
        risk_factors: &["Trauma", "Stress", "Other mental health conditions"],
        severity: "Moderate",
    },
    ConditionProfile {
        name: "migraine",
        symptoms: &["headache", "nausea", "light sensitivity", "dizziness"],
        probes: &[
            FollowUpProbe {
                question: "Does light make the pain worse?",
                symptom: "light sensitivity",
            },
            FollowUpProbe {
                question: "Do you feel dizzy?",
                symptom: "dizziness",
            },
        ],
        description: "Recurring headaches, often with nausea and sensitivity to light",
        common_causes: &["Genetic factors", "Hormonal changes", "Sleep disruption"],
        risk_factors: &["Stress", "Family history", "Irregular sleep"],
        severity: "Moderate",
    },
];

pub fn find(name: &str) -> Option<&'static ConditionProfile> {
    CONDITIONS.iter().find(|c| c.name == name)
}

/// Every known symptom phrase, first occurrence order
pub fn vocabulary() -> Vec<&'static str> {
    let mut vocab: Vec<&'static str> = Vec::new();
    for symptom in CONDITIONS.iter().flat_map(|c| c.symptoms.iter().copied()) {
        if !vocab.contains(&symptom) {
            vocab.push(symptom);
        }
    }
    vocab
}

/// Symptom implied by answering `question`
pub fn probe_symptom(question: &str) -> Option<&'static str> {
    CONDITIONS
        .iter()
        .flat_map(|c| c.probes.iter())
        .find(|p| p.question == question)
        .map(|p| p.symptom)
}
