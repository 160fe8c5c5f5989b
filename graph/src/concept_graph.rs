use async_trait::async_trait;
use nerdmath_config::MAX_TRAVERSAL_DEPTH;
use nerdmath_models::{ConceptNode, Prerequisite};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::GraphResult;

/// Keep traversal depth within `1..=MAX_TRAVERSAL_DEPTH`.
pub fn clamp_depth(depth: u32) -> u32 {
    depth.clamp(1, MAX_TRAVERSAL_DEPTH)
}

/// How a free-text name was matched to a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Similar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub concept_count: usize,
    pub precedes_count: usize,
    pub average_connections: f64,
    pub concepts_by_grade: BTreeMap<String, usize>,
    /// Ten largest units.
    pub top_units: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeEntry {
    pub concept: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub most_prerequisites: Vec<DegreeEntry>,
    pub most_successors: Vec<DegreeEntry>,
    pub isolated: Vec<String>,
    /// Total degree (in + out) to number of concepts with that degree.
    pub degree_distribution: BTreeMap<usize, usize>,
}

/// Read access to the prerequisite graph.
#[async_trait]
pub trait ConceptGraph: Send + Sync {
    /// Short name of the backing store for health output.
    fn backend(&self) -> &'static str;

    async fn health(&self) -> GraphResult<()>;

    async fn find_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>>;

    /// First concept (by name) whose name contains `name` or is contained in it.
    async fn find_similar_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>>;

    /// Every concept with a `PRECEDES` path of length `1..=max_depth` into
    /// `name`, once each at its shortest distance, ordered by depth then name.
    async fn prerequisites(&self, name: &str, max_depth: u32) -> GraphResult<Vec<Prerequisite>>;

    /// Concepts that directly require `name`.
    async fn successors(&self, name: &str, limit: usize) -> GraphResult<Vec<ConceptNode>>;

    async fn statistics(&self) -> GraphResult<GraphStatistics>;

    async fn connection_report(&self, top: usize) -> GraphResult<ConnectionReport>;

    /// Exact match first, then the similar-name fallback.
    async fn resolve_concept(&self, name: &str) -> GraphResult<Option<(ConceptNode, MatchKind)>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(node) = self.find_concept(name).await? {
            return Ok(Some((node, MatchKind::Exact)));
        }
        Ok(self
            .find_similar_concept(name)
            .await?
            .map(|node| (node, MatchKind::Similar)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_depth() {
        assert_eq!(clamp_depth(0), 1);
        assert_eq!(clamp_depth(3), 3);
        assert_eq!(clamp_depth(99), MAX_TRAVERSAL_DEPTH);
    }
}
