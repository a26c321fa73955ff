//! Identity middleware.
//!
//! Every protected request goes through the same linear checks:
//! header present, signature and expiry valid, account claim usable. The first
//! failing check rejects the request; on success the account ID is bound into
//! the request extensions for the handler.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

use super::errors::{AuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::{Identity, PresentedToken};
use crate::jwt::{JwtConfig, JwtError, signature_of};

const BEARER_PREFIX: &str = "Bearer ";

/// Strip an optional `Bearer ` scheme from an Authorization value.
fn raw_token(value: &str) -> &str {
    value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim()
}

/// Run the header, signature and claim checks against an Authorization value.
pub fn authorize(
    jwt: &JwtConfig,
    authorization: Option<&HeaderValue>,
) -> Result<(Identity, PresentedToken), AuthError> {
    let value = authorization.ok_or(AuthErrorKind::MissingToken)?;

    let token = value
        .to_str()
        .map(raw_token)
        .map_err(|_| AuthErrorKind::InvalidToken)?;

    let claims = jwt.verify(token).map_err(|e| match e {
        JwtError::Claims(_) => AuthErrorKind::InvalidClaims,
        _ => AuthErrorKind::InvalidToken,
    })?;

    let signature = signature_of(token).ok_or(AuthErrorKind::InvalidToken)?;

    Ok((
        Identity {
            account_id: claims.id,
        },
        PresentedToken {
            signature: signature.to_string(),
            expires_at: claims.exp,
        },
    ))
}

/// Middleware for routes that require a session token.
pub async fn require_identity<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let (identity, presented) =
        match authorize(state.jwt(), request.headers().get(header::AUTHORIZATION)) {
            Ok(verified) => verified,
            Err(e) => {
                tracing::debug!(path = %request.uri().path(), reason = %e, "Rejected request");
                return Err(e);
            }
        };

    if state.revocation_enabled() {
        let revoked = state
            .db()
            .revoked_tokens()
            .is_revoked(&presented.signature)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to check revocation list");
                AuthError::new(AuthErrorKind::StoreError)
            })?;

        if revoked {
            return Err(AuthErrorKind::InvalidToken.into());
        }
    }

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(presented);

    Ok(next.run(request).await)
}
