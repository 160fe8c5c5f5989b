use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use nerdmath_ai::AiError;
use nerdmath_database::mongodb::error::ErrorKind;
use nerdmath_database::DatabaseError;
use nerdmath_graph::GraphError;
use nerdmath_learning::LearningError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("AI service error: {0}")]
    Upstream(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Unavailable => ApiError::Unavailable("MongoDB is not connected".to_string()),
            DatabaseError::Mongo(ref err) if matches!(*err.kind, ErrorKind::ServerSelection { .. }) => {
                ApiError::Unavailable(e.to_string())
            }
            DatabaseError::MissingKey(_) | DatabaseError::InvalidData(_) | DatabaseError::Json(_) => {
                ApiError::BadRequest(e.to_string())
            }
            DatabaseError::Io { .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::ConceptNotFound(_) => ApiError::NotFound(e.to_string()),
            GraphError::NotConfigured(_) | GraphError::Neo4j(_) => ApiError::Unavailable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<LearningError> for ApiError {
    fn from(e: LearningError) -> Self {
        match e {
            LearningError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            LearningError::Database(err) => err.into(),
            LearningError::Graph(err) => err.into(),
            LearningError::Comment(msg) => ApiError::Upstream(msg),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::NotConfigured => ApiError::Unavailable(e.to_string()),
            AiError::OpenAi(_) | AiError::EmptyResponse => ApiError::Upstream(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (DatabaseError::Unavailable.into(), StatusCode::SERVICE_UNAVAILABLE),
            (DatabaseError::MissingKey("sets".into()).into(), StatusCode::BAD_REQUEST),
            (GraphError::ConceptNotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (GraphError::Neo4j("down".into()).into(), StatusCode::SERVICE_UNAVAILABLE),
            (LearningError::InvalidRequest("testId".into()).into(), StatusCode::BAD_REQUEST),
            (AiError::NotConfigured.into(), StatusCode::SERVICE_UNAVAILABLE),
            (AiError::EmptyResponse.into(), StatusCode::BAD_GATEWAY),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{}", error);
        }
    }
}
