use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostic::ExternalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathNode {
    pub concept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub priority: u32,
    pub is_weak_concept: bool,
    pub is_prerequisite: bool,
    /// Distance to the weak concept that pulled this node in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_level: Option<u32>,
    pub estimated_minutes: u32,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub path_id: String,
    pub user_id: ExternalId,
    pub analysis_id: String,
    pub path_name: String,
    pub description: String,
    pub nodes: Vec<LearningPathNode>,
    pub total_concepts: usize,
    /// Minutes.
    pub estimated_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_concept: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    pub fn weak_concepts(&self) -> impl Iterator<Item = &LearningPathNode> {
        self.nodes.iter().filter(|n| n.is_weak_concept)
    }
}
