use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::memory::BookStore;
use super::types::{BookPatch, DeleteResponse, ErrorResponse, LoadResponse, NewBook};
use crate::config::DEFAULT_LISTING_LIMIT;
use crate::search::types::Book;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
}

pub async fn handle_list_books(
    Extension(store): Extension<Arc<BookStore>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Book>> {
    let limit = params
        .limit
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LISTING_LIMIT);

    let mut books = store.list();
    books.truncate(limit);
    Json(books)
}

pub async fn handle_get_book(
    Extension(store): Extension<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    match store.get(&id) {
        Some(book) => Ok(Json(book)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("book {} not found", id),
            }),
        )),
    }
}

pub async fn handle_create_book(
    Extension(store): Extension<Arc<BookStore>>,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    match store.create(req) {
        Ok(book) => Ok((StatusCode::CREATED, Json(book))),
        Err(e) => {
            tracing::warn!("Rejected new book: {}", e);
            Err(e.into())
        }
    }
}

pub async fn handle_update_book(
    Extension(store): Extension<Arc<BookStore>>,
    Path(id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<Book>, ApiError> {
    match store.update(&id, patch) {
        Ok(book) => Ok(Json(book)),
        Err(e) => {
            tracing::warn!("Rejected update of book {}: {}", id, e);
            Err(e.into())
        }
    }
}

pub async fn handle_delete_book(
    Extension(store): Extension<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    match store.delete(&id) {
        Ok(book) => Ok(Json(DeleteResponse {
            message: format!("book {} deleted", book.id),
        })),
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_load_books(
    Extension(store): Extension<Arc<BookStore>>,
    Json(books): Json<Vec<NewBook>>,
) -> Result<(StatusCode, Json<LoadResponse>), ApiError> {
    match store.bulk_load(books) {
        Ok(books) => Ok((
            StatusCode::CREATED,
            Json(LoadResponse {
                message: "books loaded".to_string(),
                total_books: books.len(),
            }),
        )),
        Err(e) => {
            tracing::error!("Bulk load failed: {}", e);
            Err(e.into())
        }
    }
}
