use super::service::SearchService;
use super::types::{CategoryResponse, ClearCacheResponse, SearchOptions, SearchResponse, SearchStats};
use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

/// Raw query-string parameters. Numbers arrive as text so that an unparseable
/// value degrades to "absent" instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "minRating")]
    pub min_rating: Option<String>,
    pub language: Option<String>,
    pub limit: Option<String>,
}

impl SearchParams {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            category: self.category.clone(),
            min_rating: self
                .min_rating
                .as_deref()
                .and_then(|r| r.trim().parse::<f64>().ok()),
            language: self.language.clone(),
            limit: self
                .limit
                .as_deref()
                .and_then(|l| l.trim().parse::<usize>().ok()),
        }
        .normalized()
    }
}

pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(search): Extension<Arc<SearchService>>,
) -> Json<SearchResponse> {
    let query = params.q.clone().unwrap_or_default();
    let filters = params.options();

    let results = search.search(&query, &filters);

    Json(SearchResponse {
        query,
        filters,
        total_results: results.len(),
        results,
        search_stats: search.stats(),
    })
}

pub async fn handle_search_by_category(
    Path(category): Path<String>,
    Extension(search): Extension<Arc<SearchService>>,
) -> Json<CategoryResponse> {
    let results = search.search_by_category(&category);

    Json(CategoryResponse {
        category,
        total_results: results.len(),
        results,
    })
}

pub async fn handle_search_stats(
    Extension(search): Extension<Arc<SearchService>>,
) -> Json<SearchStats> {
    Json(search.stats())
}

pub async fn handle_clear_cache(
    Extension(search): Extension<Arc<SearchService>>,
) -> Json<ClearCacheResponse> {
    search.clear_cache();
    Json(ClearCacheResponse {
        message: "search cache cleared".to_string(),
    })
}
