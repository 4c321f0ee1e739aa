use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Request-level failure. Every variant maps to a structured JSON response;
/// nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("access denied")]
    Forbidden,
    #[error("authentication required")]
    Unauthorized,
    #[error("too many requests")]
    RateLimited,
    #[error("{0}")]
    Validation(String),
    #[error("internal error")]
    Internal(String),
    #[error("internal error")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Db(e) => tracing::error!("storage error: {e}"),
            AppError::Internal(msg) => tracing::error!("internal error: {msg}"),
            _ => {}
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Map a unique-constraint violation to a user-facing Duplicate error,
/// passing other storage failures through.
pub fn duplicate_or(err: sqlx::Error, what: &'static str) -> AppError {
    if matches!(&err, sqlx::Error::Database(dbe) if dbe.is_unique_violation()) {
        return AppError::Duplicate(what);
    }
    AppError::Db(err)
}
