use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::learning_path::LearningPath;

/// Identifier that clients send either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{n}"),
            ExternalId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        ExternalId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAnswer {
    pub problem_id: ExternalId,
    #[serde(default)]
    pub user_answer: UserAnswer,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub duration_seconds: f64,
}

/// Body of `POST /api/learning-path/express/diagnostic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressDiagnosticRequest {
    pub test_id: String,
    pub user_id: ExternalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_range: Option<String>,
    #[serde(default)]
    pub answers: Vec<DiagnosticAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_problems: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnerClass {
    Advanced,
    Proficient,
    Developing,
    Beginning,
}

impl LearnerClass {
    pub fn label_ko(&self) -> &'static str {
        match self {
            LearnerClass::Advanced => "심화 학습자",
            LearnerClass::Proficient => "숙련 학습자",
            LearnerClass::Developing => "성장 학습자",
            LearnerClass::Beginning => "기초 학습자",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallLevel {
    High,
    Medium,
    Low,
}

impl OverallLevel {
    pub fn label_ko(&self) -> &'static str {
        match self {
            OverallLevel::High => "우수",
            OverallLevel::Medium => "보통",
            OverallLevel::Low => "미흡",
        }
    }
}

/// Attempts and misses aggregated for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub unit_title: String,
    pub attempts: u32,
    pub wrong: u32,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPathItem {
    pub unit_id: String,
    pub unit_title: String,
    pub priority: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAnalysis {
    pub analysis_id: String,
    pub test_id: String,
    pub user_id: ExternalId,
    pub accuracy_rate: f64,
    pub average_seconds: f64,
    pub weak_units: Vec<String>,
    pub weak_concepts: Vec<String>,
    pub unit_stats: Vec<UnitStat>,
    pub overall_level: OverallLevel,
    pub class: LearnerClass,
    pub ai_comment: String,
    pub recommended_path: Vec<RecommendedPathItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_start_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_start_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_range: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressDiagnosticResponse {
    pub success: bool,
    pub message: String,
    pub result_id: String,
    pub analysis: DiagnosticAnalysis,
    pub learning_path: LearningPath,
}
