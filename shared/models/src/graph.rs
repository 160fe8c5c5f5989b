use serde::{Deserialize, Serialize};

/// A `Concept` node of the prerequisite graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptNode {
    pub concept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl ConceptNode {
    pub fn named(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            unit: None,
            grade: None,
        }
    }
}

/// `(source)-[:PRECEDES]->(target)`: source must be learned before target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrecedesEdge {
    pub source: String,
    pub target: String,
}

/// A concept reachable backwards over `PRECEDES`, at its shortest distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    #[serde(flatten)]
    pub node: ConceptNode,
    pub depth: u32,
}
