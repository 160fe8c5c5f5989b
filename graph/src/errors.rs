use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j error: {0}")]
    Neo4j(String),

    #[error("Graph database not configured: {0}")]
    NotConfigured(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {message}")]
    Csv { path: String, message: String },
}

impl From<neo4rs::Error> for GraphError {
    fn from(e: neo4rs::Error) -> Self {
        GraphError::Neo4j(e.to_string())
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
