//! Account management endpoints.
//!
//! - POST `/` - Register an account (public)
//! - GET `/` - List accounts
//! - POST `/add` - Register several accounts at once
//! - GET `/{id}` - Get one account
//! - PUT `/{id}` - Replace your own account
//! - DELETE `/{id}` - Delete your own account

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use super::error::{ApiError, ResultExt, check_batch, parse_id, require_text};
use super::{CreatedManyResponse, CreatedResponse, MessageResponse};
use crate::auth::{Identity, require_identity};
use crate::credentials::hash_password_blocking;
use crate::db::{Account, Database, NewAccount, StoreError};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

const MAX_NAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PASSWORD_LEN: usize = 1024;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub revocation: bool,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    let identity = middleware::from_fn_with_state(state.clone(), require_identity::<UsersState>);

    // Registration is the only public method; the layer only wraps methods added before it.
    Router::new()
        .route(
            "/",
            get(list_users)
                .route_layer(identity.clone())
                .post(create_user),
        )
        .route("/add", post(add_users).route_layer(identity.clone()))
        .route(
            "/{id}",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .route_layer(identity),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct AccountRequest {
    name: String,
    email: String,
    password: String,
}

fn validate_account(req: &AccountRequest) -> Result<(), ApiError> {
    require_text("Name", &req.name, MAX_NAME_LEN)?;
    if req.name.trim() != req.name {
        return Err(ApiError::bad_request(
            "Name cannot start or end with whitespace",
        ));
    }

    validate_email(&req.email)?;

    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password cannot be longer than {} bytes",
            MAX_PASSWORD_LEN
        )));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    require_text("Email", email, MAX_EMAIL_LEN)?;

    let valid = !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };

    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request("Email is not a valid address"))
    }
}

async fn into_new_account(req: AccountRequest) -> Result<NewAccount, ApiError> {
    let credential = hash_password_blocking(req.password).await.map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::internal("Failed to hash password")
    })?;

    Ok(NewAccount {
        name: req.name,
        email: req.email,
        credential,
    })
}

/// Map a write failure, turning a duplicate name into a conflict.
fn write_error(context: &str, e: StoreError) -> ApiError {
    if e.is_unique_violation() {
        ApiError::conflict("Name is already taken")
    } else {
        ApiError::store_error(context, e)
    }
}

fn require_self(identity: Identity, id: i64) -> Result<(), ApiError> {
    if identity.account_id == id {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only modify your own account"))
    }
}

async fn list_users(State(state): State<UsersState>) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = state
        .db
        .accounts()
        .list()
        .await
        .store_err("Failed to list accounts")?;

    Ok(Json(accounts))
}

async fn get_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&id)?;

    let account = state
        .db
        .accounts()
        .get(id)
        .await
        .store_err("Failed to get account")?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(account))
}

async fn create_user(
    State(state): State<UsersState>,
    payload: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(payload) = payload?;
    validate_account(&payload)?;

    let account = into_new_account(payload).await?;
    let id = state
        .db
        .accounts()
        .create(&account)
        .await
        .map_err(|e| write_error("Failed to create account", e))?;

    info!(account_id = id, "Account registered");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Account created",
            id,
        }),
    ))
}

async fn add_users(
    State(state): State<UsersState>,
    payload: Result<Json<Vec<AccountRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedManyResponse>), ApiError> {
    let Json(payload) = payload?;
    check_batch(payload.len(), "accounts")?;

    // Validate the whole batch before hashing anything.
    for req in &payload {
        validate_account(req)?;
    }

    let mut accounts = Vec::with_capacity(payload.len());
    for req in payload {
        accounts.push(into_new_account(req).await?);
    }

    let ids = state
        .db
        .accounts()
        .create_many(&accounts)
        .await
        .map_err(|e| write_error("Failed to add accounts", e))?;

    info!(count = ids.len(), "Accounts registered in bulk");
    Ok((
        StatusCode::CREATED,
        Json(CreatedManyResponse {
            message: "Accounts added",
            ids,
        }),
    ))
}

async fn update_user(
    State(state): State<UsersState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    require_self(identity, id)?;

    let Json(payload) = payload?;
    validate_account(&payload)?;

    let account = into_new_account(payload).await?;
    let updated = state
        .db
        .accounts()
        .update(id, &account)
        .await
        .map_err(|e| write_error("Failed to update account", e))?;

    if !updated {
        return Err(ApiError::not_found("Account not found"));
    }

    info!(account_id = id, "Account updated");
    Ok(Json(MessageResponse::new("Account updated")))
}

async fn delete_user(
    State(state): State<UsersState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    require_self(identity, id)?;

    let deleted = state
        .db
        .accounts()
        .delete(id)
        .await
        .store_err("Failed to delete account")?;

    if !deleted {
        return Err(ApiError::not_found("Account not found"));
    }

    info!(account_id = id, "Account deleted");
    Ok(Json(MessageResponse::new("Account deleted")))
}
