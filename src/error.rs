use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers. Everything below the handlers
/// returns `anyhow` or `io` errors and is mapped onto one of these.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{message}: {details}")]
    Internal { message: String, details: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>, err: impl fmt::Display) -> Self {
        AppError::Internal {
            message: message.into(),
            details: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                tracing::warn!("{}", self);
                serde_json::json!({ "error": msg })
            }
            AppError::Internal { message, details } => {
                tracing::error!("{}", self);
                serde_json::json!({ "error": message, "details": details })
            }
        };
        (status, Json(body)).into_response()
    }
}
