use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A book as held by the library.
///
/// Only the six descriptive fields take part in search. Anything else the
/// client sent (cover image, drive link, page count, publication year, ...)
/// is kept in `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub language: String,
    #[serde(default)]
    pub rating: f64,
    /// Milliseconds since the epoch, set by the store.
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AsRef<Book> for Book {
    fn as_ref(&self) -> &Book {
        self
    }
}

/// Searchable book fields, in the order they are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Author,
    Description,
    Category,
    Language,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Title,
        Field::Author,
        Field::Description,
        Field::Category,
        Field::Language,
    ];

    /// Raw relevance weight before normalisation.
    pub fn weight(self) -> f64 {
        match self {
            Field::Title => 0.7,
            Field::Author => 0.5,
            Field::Category => 0.4,
            Field::Description => 0.3,
            Field::Language => 0.2,
        }
    }

    pub fn value(self, book: &Book) -> &str {
        match self {
            Field::Title => &book.title,
            Field::Author => &book.author,
            Field::Description => &book.description,
            Field::Category => &book.category,
            Field::Language => &book.language,
        }
    }
}

/// One field that contributed to a match, with inclusive character spans
/// for highlighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatch {
    pub key: Field,
    pub value: String,
    pub indices: Vec<(usize, usize)>,
}

/// A book returned by a search.
///
/// `search_score` is absent when the book was returned without ranking
/// (short queries and pure filter browsing). Lower scores are better.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    #[serde(flatten)]
    pub book: Book,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_score: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<FieldMatch>,
}

impl ScoredMatch {
    pub fn unscored(book: Book) -> Self {
        Self {
            book,
            search_score: None,
            matches: Vec::new(),
        }
    }
}

impl AsRef<Book> for ScoredMatch {
    fn as_ref(&self) -> &Book {
        &self.book
    }
}

/// Post-match constraints of a search request. Every field is optional and
/// an absent field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Case-insensitive substring of the book category.
    pub category: Option<String>,
    /// Inclusive lower bound on the book rating.
    pub min_rating: Option<f64>,
    /// Case-insensitive exact book language.
    pub language: Option<String>,
    pub limit: Option<usize>,
}

impl SearchOptions {
    /// Drops values that cannot constrain anything: blank strings,
    /// non-finite or non-positive ratings and a zero limit.
    pub fn normalized(&self) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            category: text(&self.category),
            min_rating: self.min_rating.filter(|r| r.is_finite() && *r > 0.0),
            language: text(&self.language),
            limit: self.limit.filter(|l| *l > 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_books: usize,
    pub cache_keys: usize,
    pub cache_stats: CacheStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub filters: SearchOptions,
    pub total_results: usize,
    pub results: Vec<ScoredMatch>,
    pub search_stats: SearchStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub category: String,
    pub total_results: usize,
    pub results: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
}
