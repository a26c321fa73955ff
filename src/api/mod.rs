mod auth;
mod books;
mod error;
mod users;

use axum::Router;
use serde::Serialize;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;

pub use auth::AuthState;
pub use books::BooksState;
pub use error::{ApiError, MAX_BATCH, ResultExt};
pub use users::UsersState;

/// Body of most successful responses, and of every error response.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for endpoints that create one record.
#[derive(Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i64,
}

/// Response for bulk endpoints.
#[derive(Serialize)]
pub struct CreatedManyResponse {
    pub message: &'static str,
    pub ids: Vec<i64>,
}

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, revocation: bool) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt: jwt.clone(),
        revocation,
    };

    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
        revocation,
    };

    let books_state = books::BooksState {
        db,
        jwt,
        revocation,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/users", users::router(users_state))
        .nest("/books", books::router(books_state))
}
