use async_trait::async_trait;
use nerdmath_models::{ConceptNode, Prerequisite};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::concept_graph::{
    clamp_depth, ConceptGraph, ConnectionReport, DegreeEntry, GraphStatistics,
};
use crate::errors::GraphResult;
use crate::import::GraphImport;

/// Prerequisite graph held in process, built from the CSV exports.
#[derive(Debug, Default)]
pub struct InMemoryConceptGraph {
    graph: DiGraph<ConceptNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl InMemoryConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_import(import: &GraphImport) -> Self {
        let mut graph = Self::new();
        for node in &import.nodes {
            graph.add_concept(node.clone());
        }
        let mut dangling = 0usize;
        for edge in &import.edges {
            if !graph.add_precedes(&edge.source, &edge.target) {
                dangling += 1;
            }
        }
        if dangling > 0 {
            tracing::warn!(dangling, "Skipped edges referencing unknown concepts");
        }
        graph
    }

    pub fn add_concept(&mut self, node: ConceptNode) -> NodeIndex {
        if let Some(idx) = self.index.get(&node.concept) {
            return *idx;
        }
        let name = node.concept.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(name, idx);
        idx
    }

    /// Returns false when either endpoint is unknown.
    pub fn add_precedes(&mut self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => {
                self.graph.update_edge(a, b, ());
                true
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn ranked(&self, direction: Direction, top: usize) -> Vec<DegreeEntry> {
        let mut entries: Vec<DegreeEntry> = self
            .graph
            .node_indices()
            .map(|idx| DegreeEntry {
                concept: self.graph[idx].concept.clone(),
                count: self.graph.neighbors_directed(idx, direction).count(),
            })
            .filter(|e| e.count > 0)
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.concept.cmp(&b.concept)));
        entries.truncate(top);
        entries
    }
}

#[async_trait]
impl ConceptGraph for InMemoryConceptGraph {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health(&self) -> GraphResult<()> {
        Ok(())
    }

    async fn find_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>> {
        Ok(self.index.get(name).map(|idx| self.graph[*idx].clone()))
    }

    async fn find_similar_concept(&self, name: &str) -> GraphResult<Option<ConceptNode>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self
            .graph
            .node_weights()
            .filter(|n| n.concept.contains(name) || name.contains(n.concept.as_str()))
            .min_by(|a, b| a.concept.cmp(&b.concept))
            .cloned())
    }

    async fn prerequisites(&self, name: &str, max_depth: u32) -> GraphResult<Vec<Prerequisite>> {
        let Some(&start) = self.index.get(name) else {
            return Ok(Vec::new());
        };
        let max_depth = clamp_depth(max_depth);

        let mut depth_of: HashMap<NodeIndex, u32> = HashMap::new();
        let mut queue = VecDeque::from([(start, 0u32)]);
        while let Some((idx, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for pre in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if pre == start || depth_of.contains_key(&pre) {
                    continue;
                }
                depth_of.insert(pre, depth + 1);
                queue.push_back((pre, depth + 1));
            }
        }

        let mut result: Vec<Prerequisite> = depth_of
            .into_iter()
            .map(|(idx, depth)| Prerequisite {
                node: self.graph[idx].clone(),
                depth,
            })
            .collect();
        result.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.node.concept.cmp(&b.node.concept)));
        Ok(result)
    }

    async fn successors(&self, name: &str, limit: usize) -> GraphResult<Vec<ConceptNode>> {
        let Some(&idx) = self.index.get(name) else {
            return Ok(Vec::new());
        };
        let mut nodes: Vec<ConceptNode> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        nodes.sort_by(|a, b| a.concept.cmp(&b.concept));
        nodes.truncate(limit);
        Ok(nodes)
    }

    async fn statistics(&self) -> GraphResult<GraphStatistics> {
        let mut by_grade = BTreeMap::new();
        let mut by_unit: HashMap<String, usize> = HashMap::new();
        for node in self.graph.node_weights() {
            if let Some(grade) = &node.grade {
                *by_grade.entry(grade.clone()).or_insert(0) += 1;
            }
            if let Some(unit) = &node.unit {
                *by_unit.entry(unit.clone()).or_insert(0) += 1;
            }
        }
        let mut top_units: Vec<(String, usize)> = by_unit.into_iter().collect();
        top_units.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_units.truncate(10);

        let concept_count = self.node_count();
        let precedes_count = self.edge_count();
        Ok(GraphStatistics {
            concept_count,
            precedes_count,
            average_connections: if concept_count == 0 {
                0.0
            } else {
                precedes_count as f64 / concept_count as f64
            },
            concepts_by_grade: by_grade,
            top_units,
        })
    }

    async fn connection_report(&self, top: usize) -> GraphResult<ConnectionReport> {
        let mut report = ConnectionReport {
            most_prerequisites: self.ranked(Direction::Incoming, top),
            most_successors: self.ranked(Direction::Outgoing, top),
            ..Default::default()
        };
        for idx in self.graph.node_indices() {
            let degree = self.graph.neighbors_directed(idx, Direction::Incoming).count()
                + self.graph.neighbors_directed(idx, Direction::Outgoing).count();
            if degree == 0 {
                report.isolated.push(self.graph[idx].concept.clone());
            }
            *report.degree_distribution.entry(degree).or_insert(0) += 1;
        }
        report.isolated.sort();
        Ok(report)
    }
}
