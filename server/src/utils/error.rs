use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Query error")]
    QueryError(#[source] StoreError),

    #[error("Persistence error")]
    PersistenceError(#[source] StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Query(_) => AppError::QueryError(err),
            StoreError::Persistence(_) => AppError::PersistenceError(err),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::QueryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::QueryError(_) => "QUERY_ERROR",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Text sent to the client. Storage failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::QueryError(_) => "Failed to fetch events".to_string(),
            AppError::PersistenceError(_) => "Failed to save event".to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::QueryError(e) | AppError::PersistenceError(e) => {
                error!(code = self.code(), error = ?e, "Storage error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_by_kind() {
        let err: AppError = StoreError::Query(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, AppError::QueryError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = StoreError::Persistence(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, AppError::PersistenceError(_)));
        assert_eq!(err.public_message(), "Failed to save event");
    }

    #[test]
    fn test_storage_detail_is_not_exposed() {
        let err: AppError =
            StoreError::Query(sqlx::Error::Protocol("password mismatch".into())).into();
        assert!(!err.public_message().contains("password"));
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = AppError::ValidationError("Invalid year".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid year");

        let response = AppError::NotFound("Event 3 not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
