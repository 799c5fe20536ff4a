use super::store::ReviewStore;
use super::types::{BookReviewsResponse, NewReview, Review, ReviewPatch};
use crate::storage::types::{DeleteResponse, ErrorResponse};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn handle_create_review(
    Extension(reviews): Extension<Arc<ReviewStore>>,
    Json(req): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    match reviews.create(req) {
        Ok(review) => Ok((StatusCode::CREATED, Json(review))),
        Err(e) => {
            tracing::warn!("Rejected review: {}", e);
            Err(e.into())
        }
    }
}

pub async fn handle_book_reviews(
    Extension(reviews): Extension<Arc<ReviewStore>>,
    Path(book_id): Path<String>,
) -> Result<Json<BookReviewsResponse>, ApiError> {
    let list = reviews.list_for_book(&book_id).map_err(ApiError::from)?;

    Ok(Json(BookReviewsResponse {
        average_rating: reviews.average_rating(&book_id),
        total_reviews: list.len(),
        book_id,
        reviews: list,
    }))
}

pub async fn handle_update_review(
    Extension(reviews): Extension<Arc<ReviewStore>>,
    Path(id): Path<String>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<Review>, ApiError> {
    reviews
        .update(&id, patch)
        .map(Json)
        .map_err(ApiError::from)
}

pub async fn handle_delete_review(
    Extension(reviews): Extension<Arc<ReviewStore>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let review = reviews.delete(&id).map_err(ApiError::from)?;

    Ok(Json(DeleteResponse {
        message: format!("review {} deleted", review.id),
    }))
}
