use nerdmath_database::DatabaseError;
use nerdmath_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearningError {
    #[error("Invalid diagnostic request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Comment generation failed: {0}")]
    Comment(String),
}

pub type LearningResult<T> = Result<T, LearningError>;
