//! Concept prerequisite graph.
//!
//! `Concept` nodes are linked by `(a)-[:PRECEDES]->(b)`, meaning `a` must be
//! learned before `b`. The graph is served from Neo4j when it is reachable
//! and from an in-memory petgraph copy of the CSV exports otherwise.

pub mod concept_graph;
pub mod errors;
pub mod graph_db;
pub mod import;
pub mod memory;

pub use concept_graph::*;
pub use errors::{GraphError, GraphResult};
pub use graph_db::Neo4jConceptGraph;
pub use import::GraphImport;
pub use memory::InMemoryConceptGraph;
