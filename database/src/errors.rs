use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] nerdmath_config::ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Required key '{0}' not found in data")]
    MissingKey(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Document store unavailable")]
    Unavailable,
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
