//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why a request was rejected before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No `Authorization` header
    MissingToken,
    /// Bad structure, bad signature, expired or revoked
    InvalidToken,
    /// Signature is fine but the account claim is unusable
    InvalidClaims,
    /// The revocation list could not be consulted
    StoreError,
    /// A handler asked for an identity on a route without the middleware
    Unbound,
}

/// Middleware rejection. Rendered as `{"message": ...}` JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::MissingToken | AuthErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthErrorKind::InvalidClaims => StatusCode::FORBIDDEN,
            AuthErrorKind::StoreError => StatusCode::BAD_REQUEST,
            AuthErrorKind::Unbound => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingToken => "Authorization token is missing",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::InvalidClaims => "Unauthorized access to the account",
            AuthErrorKind::StoreError => "Storage error",
            AuthErrorKind::Unbound => "Internal server error",
        }
    }
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                message: self.message(),
            }),
        )
            .into_response()
    }
}
