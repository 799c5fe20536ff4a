//! HTTP Router
//!
//! Wires every handler to its route and injects the shared services as
//! `Extension` layers.

use crate::reviews::handlers::*;
use crate::reviews::store::ReviewStore;
use crate::search::handlers::*;
use crate::search::service::SearchService;
use crate::storage::handlers::*;
use crate::storage::memory::BookStore;

use axum::{
    Router,
    extract::Extension,
    routing::{get, post, put},
};
use std::sync::Arc;

pub fn build_router(
    books: Arc<BookStore>,
    search: Arc<SearchService>,
    reviews: Arc<ReviewStore>,
) -> Router {
    Router::new()
        .route("/books", get(handle_list_books).post(handle_create_book))
        .route("/books/load", post(handle_load_books))
        .route("/books/search", get(handle_search))
        .route("/books/category/:category", get(handle_search_by_category))
        .route("/books/stats", get(handle_search_stats))
        .route("/books/cache/clear", post(handle_clear_cache))
        .route(
            "/books/:id",
            get(handle_get_book)
                .put(handle_update_book)
                .delete(handle_delete_book),
        )
        .route("/reviews", post(handle_create_review))
        .route("/reviews/book/:book_id", get(handle_book_reviews))
        .route(
            "/reviews/:id",
            put(handle_update_review).delete(handle_delete_review),
        )
        .layer(Extension(books))
        .layer(Extension(search))
        .layer(Extension(reviews))
}
