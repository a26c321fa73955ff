//! Login and session endpoints.
//!
//! - POST `/login` - Exchange name and password for a session token
//! - GET `/profile` - Account bound to the presented token
//! - POST `/logout` - Revoke the presented token (only with revocation enabled)

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::MessageResponse;
use super::error::{ApiError, ResultExt};
use crate::auth::{Identity, PresentedToken, require_identity};
use crate::credentials::{CredentialError, verify_credentials};
use crate::db::{Account, Database};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub revocation: bool,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    let identity = middleware::from_fn_with_state(state.clone(), require_identity::<AuthState>);

    let router = Router::new()
        .route("/login", post(login))
        .route("/profile", get(profile).route_layer(identity.clone()));

    let router = if state.revocation {
        router.route("/logout", post(logout).route_layer(identity))
    } else {
        router
    };

    router.with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    name: String,
    password: String,
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;

    if payload.name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let account_id = match verify_credentials(&state.db, &payload.name, &payload.password).await {
        Ok(id) => id,
        Err(CredentialError::InvalidCredentials) => {
            debug!("Login rejected");
            return Err(ApiError::bad_request("Invalid credentials"));
        }
        Err(CredentialError::Store(e)) => {
            return Err(ApiError::store_error("Failed to look up credentials", e));
        }
        Err(e) => {
            error!(error = %e, "Failed to verify credentials");
            return Err(ApiError::internal("Failed to verify credentials"));
        }
    };

    let issued = state.jwt.issue(account_id).map_err(|e| {
        error!(error = %e, "Failed to issue session token");
        ApiError::internal("Failed to issue token")
    })?;

    info!(account_id, "Login succeeded");
    Ok(Json(MessageResponse::new(issued.token)))
}

async fn profile(
    State(state): State<AuthState>,
    identity: Identity,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .db
        .accounts()
        .get(identity.account_id)
        .await
        .store_err("Failed to get account")?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(account))
}

async fn logout(
    State(state): State<AuthState>,
    identity: Identity,
    token: PresentedToken,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .db
        .revoked_tokens()
        .revoke(&token.signature, token.expires_at)
        .await
        .store_err("Failed to revoke token")?;

    info!(account_id = identity.account_id, "Logged out");
    Ok(Json(MessageResponse::new("Logged out")))
}
