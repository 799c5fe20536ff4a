//! In-memory search index.
//!
//! Built once from a snapshot of the library and never modified afterwards;
//! a changed book set always means a new index.

use super::fuzzy::fold_chars;
use super::types::{Book, Field};
use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^ ]+").unwrap());

/// One searchable field of one book, pre-folded for matching.
#[derive(Debug, Clone)]
pub struct IndexedField {
    pub field: Field,
    pub folded: Vec<char>,
    /// Field-length norm: shorter fields weigh more for the same match.
    pub norm: f64,
}

#[derive(Debug, Clone, Default)]
pub struct IndexedRecord {
    pub fields: Vec<IndexedField>,
}

#[derive(Debug, Clone, Default)]
pub struct BookIndex {
    books: Vec<Book>,
    records: Vec<IndexedRecord>,
}

impl BookIndex {
    /// Indexes every non-blank searchable field of `books`, preserving order.
    pub fn build(books: Vec<Book>) -> Self {
        let records = books
            .iter()
            .map(|book| IndexedRecord {
                fields: Field::ALL
                    .iter()
                    .filter_map(|&field| {
                        let value = field.value(book);
                        if value.trim().is_empty() {
                            return None;
                        }
                        Some(IndexedField {
                            field,
                            folded: fold_chars(value),
                            norm: field_norm(value),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self { books, records }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Weight of `field` relative to the sum of all field weights.
pub fn normalized_weight(field: Field) -> f64 {
    let total: f64 = Field::ALL.iter().map(|f| f.weight()).sum();
    field.weight() / total
}

/// `1 / sqrt(token count)`, rounded to three decimals.
pub fn field_norm(value: &str) -> f64 {
    let tokens = TOKEN.find_iter(value).count().max(1);
    let norm = 1.0 / (tokens as f64).sqrt();
    (norm * 1000.0).round() / 1000.0
}
