//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::db::StoreError;

/// Extension trait for concise error mapping on store results.
pub trait ResultExt<T> {
    fn store_err(self, context: &str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, StoreError> {
    fn store_err(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::store_error(context, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Log the store failure and return a generic client error without its details.
    pub fn store_error(context: &str, e: StoreError) -> Self {
        error!(error = %e, "{}", context);
        Self::BadRequest("Storage error".into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Largest list accepted by the bulk endpoints.
pub const MAX_BATCH: usize = 100;

/// Reject an empty or oversized bulk list before any entry is looked at.
pub fn check_batch(len: usize, what: &str) -> Result<(), ApiError> {
    if len == 0 {
        return Err(ApiError::bad_request(format!("No {} provided", what)));
    }
    if len > MAX_BATCH {
        return Err(ApiError::bad_request(format!(
            "Cannot add more than {} {} at once",
            MAX_BATCH, what
        )));
    }
    Ok(())
}

/// Parse a numeric path ID.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}

/// Reject empty or overlong text fields. Returns the value unchanged.
pub fn require_text<'a>(field: &str, value: &'a str, max_len: usize) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{} cannot be longer than {} characters",
            field, max_len
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(ApiError::bad_request(format!(
            "{} cannot contain control characters",
            field
        )));
    }
    Ok(value)
}
