//! Axum extractors for the identity bound by [`require_identity`](super::require_identity).

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use super::errors::{AuthError, AuthErrorKind};
use super::types::{Identity, PresentedToken};

/// Extensions are only missing when a route was mounted without the identity layer.
fn unbound(parts: &Parts) -> AuthError {
    error!(path = %parts.uri.path(), "Identity requested on a route without require_identity");
    AuthError::new(AuthErrorKind::Unbound)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(*identity),
            None => Err(unbound(parts)),
        }
    }
}

impl<S> FromRequestParts<S> for PresentedToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<PresentedToken>() {
            Some(token) => Ok(token.clone()),
            None => Err(unbound(parts)),
        }
    }
}
