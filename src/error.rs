use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use crate::models::ApiResponse;
use crate::services::StoreError;

/// Errors surfaced by the recommendation core
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid subjects: {0}")]
    InvalidSubjects(String),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Carries the operation and key parameters, never the query text
    #[error("query failed: {operation} ({context})")]
    QueryFailed {
        operation: &'static str,
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("admission store not initialized")]
    NotInitialized,

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },
}

impl RecommendError {
    pub fn query_failed(operation: &'static str, context: impl Into<String>, source: StoreError) -> Self {
        RecommendError::QueryFailed {
            operation,
            context: context.into(),
            source,
        }
    }
}

impl ResponseError for RecommendError {
    fn status_code(&self) -> StatusCode {
        match self {
            RecommendError::InvalidArgument(_) | RecommendError::InvalidSubjects(_) => StatusCode::BAD_REQUEST,
            RecommendError::NotFound(_) => StatusCode::NOT_FOUND,
            RecommendError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RecommendError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RecommendError::QueryFailed { .. } | RecommendError::NotInitialized => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ApiResponse::<()>::error(status.as_u16(), self.to_string()))
    }
}

impl From<validator::ValidationErrors> for RecommendError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RecommendError::InvalidArgument(errors.to_string())
    }
}
