use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with message
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Forbidden access
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Resource not found
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Uniqueness violation, e.g. a connector name already used in the organization
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Internal server error
    #[error("Internal Error: {0}")]
    Internal(String),
    /// External service error
    #[error("External Service Error: {0}")]
    ExternalService(String),
    /// Validation error
    #[error("Validation Error: {0}")]
    Validation(String),
}

impl AppError {
    /// The message without the variant prefix, suitable for end users.
    pub fn user_message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg)
            | AppError::ExternalService(msg)
            | AppError::Validation(msg) => msg,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type) = match self {
            AppError::BadRequest(_) => (actix_web::http::StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (actix_web::http::StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (actix_web::http::StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (actix_web::http::StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (actix_web::http::StatusCode::CONFLICT, "conflict"),
            AppError::Internal(_) => (actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::ExternalService(_) => (actix_web::http::StatusCode::BAD_GATEWAY, "external_service_error"),
            AppError::Validation(_) => (actix_web::http::StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_type,
            "message": self.user_message()
        }))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
