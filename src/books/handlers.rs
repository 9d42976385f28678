use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{
    dto::{BookFilter, CreateBookRequest, UpdateBookRequest},
    repo::Book,
};
use crate::error::{ApiError, FieldError};
use crate::response::success;
use crate::state::AppState;

/// Keeps a non-numeric `:id` inside the JSON error envelope instead of
/// axum's plain-text rejection.
fn book_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) =
        id.map_err(|_| ApiError::Validation(vec![FieldError::new("id", "Invalid book ID")]))?;
    Ok(id)
}

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/book", get(list_books))
        .route("/book", post(create_book))
        .route("/book/:id", get(get_book))
        .route("/book/:id", put(update_book))
        .route("/book/:id", delete(delete_book))
}

#[instrument(skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Value>, ApiError> {
    let books = Book::list(&state.db, &filter).await?;
    Ok(success(books))
}

#[instrument(skip(state, id))]
pub async fn get_book(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = book_id(id)?;
    let book = Book::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".into()))?;
    Ok(success(book))
}

#[instrument(skip(state, payload))]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let year = payload.validate()?;
    let book = Book::create(&state.db, &payload.title, &payload.author, year).await?;
    info!(book_id = book.id, "book created");
    Ok((StatusCode::CREATED, success(book)))
}

#[instrument(skip(state, id, payload))]
pub async fn update_book(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = book_id(id)?;
    payload.validate()?;
    let book = Book::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.author.as_deref(),
        payload.year,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Book not found".into()))?;
    info!(book_id = book.id, "book updated");
    Ok(success(book))
}

#[instrument(skip(state, id))]
pub async fn delete_book(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = book_id(id)?;
    if !Book::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Book not found".into()));
    }
    info!(book_id = id, "book deleted");
    Ok(Json(json!({
        "status": "success",
        "message": "Book deleted successfully",
    })))
}
