//! Post-match filtering and truncation.
//!
//! Filters run conjunctively in a fixed order (category, minimum rating,
//! language) and never reorder their input.

use super::types::{Book, SearchOptions};

/// Case-insensitive substring match on the category.
pub fn matches_category(book: &Book, category: &str) -> bool {
    book.category
        .to_lowercase()
        .contains(&category.to_lowercase())
}

/// Case-insensitive exact match on the language.
pub fn matches_language(book: &Book, language: &str) -> bool {
    book.language.to_lowercase() == language.to_lowercase()
}

pub fn apply_filters<T: AsRef<Book>>(items: Vec<T>, options: &SearchOptions) -> Vec<T> {
    let mut items = items;

    if let Some(category) = options.category.as_deref() {
        items.retain(|item| matches_category(item.as_ref(), category));
    }
    if let Some(min_rating) = options.min_rating {
        items.retain(|item| item.as_ref().rating >= min_rating);
    }
    if let Some(language) = options.language.as_deref() {
        items.retain(|item| matches_language(item.as_ref(), language));
    }

    items
}

/// Filters, then keeps at most `options.limit` items (or `default_limit`).
pub fn filter_and_limit<T: AsRef<Book>>(
    items: Vec<T>,
    options: &SearchOptions,
    default_limit: usize,
) -> Vec<T> {
    let mut items = apply_filters(items, options);
    items.truncate(options.limit.unwrap_or(default_limit));
    items
}
