//! Book endpoints. Every route is scoped to the caller's account.
//!
//! - GET `/` - List your books
//! - POST `/` - Add one book
//! - POST `/add` - Add several books in one transaction

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, check_batch, require_text};
use super::{CreatedManyResponse, CreatedResponse};
use crate::auth::{Identity, require_identity};
use crate::db::{Book, Database, NewBook};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

const MAX_FIELD_LEN: usize = 256;

#[derive(Clone)]
pub struct BooksState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub revocation: bool,
}

impl_has_auth_backend!(BooksState);

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/add", post(add_books))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity::<BooksState>,
        ))
        .with_state(state)
}

#[derive(Deserialize)]
struct BookRequest {
    label: String,
    author: String,
}

impl BookRequest {
    fn validate(self) -> Result<NewBook, ApiError> {
        require_text("Label", &self.label, MAX_FIELD_LEN)?;
        require_text("Author", &self.author, MAX_FIELD_LEN)?;
        Ok(NewBook {
            label: self.label,
            author: self.author,
        })
    }
}

async fn list_books(
    State(state): State<BooksState>,
    identity: Identity,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .db
        .books()
        .list_for_user(identity.account_id)
        .await
        .store_err("Failed to list books")?;

    Ok(Json(books))
}

async fn add_book(
    State(state): State<BooksState>,
    identity: Identity,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(payload) = payload?;
    let book = payload.validate()?;

    let id = state
        .db
        .books()
        .create(identity.account_id, &book)
        .await
        .store_err("Failed to add book")?;

    info!(account_id = identity.account_id, book_id = id, "Book added");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Book added",
            id,
        }),
    ))
}

async fn add_books(
    State(state): State<BooksState>,
    identity: Identity,
    payload: Result<Json<Vec<BookRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedManyResponse>), ApiError> {
    let Json(payload) = payload?;
    check_batch(payload.len(), "books")?;

    let books = payload
        .into_iter()
        .map(BookRequest::validate)
        .collect::<Result<Vec<_>, _>>()?;

    let ids = state
        .db
        .books()
        .create_many(identity.account_id, &books)
        .await
        .store_err("Failed to add books")?;

    info!(
        account_id = identity.account_id,
        count = ids.len(),
        "Books added in bulk"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedManyResponse {
            message: "Books added",
            ids,
        }),
    ))
}
