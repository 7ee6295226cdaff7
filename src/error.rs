use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NavError {
    #[error("{0}")]
    Validation(String),

    #[error("setup failed: {0}")]
    StorageInit(String),

    #[error("storage is not initialized")]
    StorageUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Not found")]
    NotFound,

    #[error("too many attempts, try again later")]
    RateLimited,
}

impl NavError {
    pub fn validation(msg: impl Into<String>) -> Self {
        NavError::Validation(msg.into())
    }
}

impl IntoResponse for NavError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            NavError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg,
                },
            ),
            NavError::NotFound => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: "Resource not found.".to_string(),
                },
            ),
            NavError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody {
                    code: "RATE_LIMITED".to_string(),
                    message: "Too many attempts, try again later.".to_string(),
                },
            ),
            NavError::StorageUnavailable | NavError::StorageInit(_) => {
                tracing::error!(error = %self, "storage unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiErrorBody {
                        code: "STORAGE_UNAVAILABLE".to_string(),
                        message: "Storage is not available.".to_string(),
                    },
                )
            }
            NavError::DatabaseError(_)
            | NavError::Io(_)
            | NavError::Json(_)
            | NavError::Template(_)
            | NavError::PasswordHash(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
