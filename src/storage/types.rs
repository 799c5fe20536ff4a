//! Storage Data Types
//!
//! Write payloads accepted by the book store, its error type, and the two seams
//! through which the search service is wired to it.

use crate::search::types::Book;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A book as submitted by a client. `id` is optional; the store assigns one when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub language: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update. Absent fields are left untouched; `extra` keys are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("{0} already exists")]
    Conflict(String),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Invalid { .. } => StatusCode::BAD_REQUEST,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<StoreError> for (StatusCode, axum::Json<ErrorResponse>) {
    fn from(err: StoreError) -> Self {
        (
            err.status_code(),
            axum::Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub message: String,
    pub total_books: usize,
}

/// Supplies the complete, current book list on demand.
pub trait BookSource: Send + Sync {
    fn list_books(&self) -> Vec<Book>;
}

/// Told about every change to the book collection, with the full list after the change.
pub trait MutationListener: Send + Sync {
    fn on_books_changed(&self, books: Vec<Book>);
}
