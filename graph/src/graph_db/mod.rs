mod maintenance;
mod neo4j_client;

pub use maintenance::{ImportSummary, RebuildReport};
pub use neo4j_client::Neo4jConceptGraph;
