use super::types::*;
use crate::search::types::Book;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

struct StoredBook {
    seq: u64,
    book: Book,
}

/// In-memory book collection.
///
/// Listing order is insertion order. Every successful write notifies the
/// registered [`MutationListener`]s with the complete list after the write;
/// writes and their notifications are serialized so listeners never observe
/// an older list after a newer one.
pub struct BookStore {
    books: DashMap<String, StoredBook>,
    next_seq: AtomicU64,
    writes: Mutex<()>,
    listeners: RwLock<Vec<Weak<dyn MutationListener>>>,
}

impl BookStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            books: DashMap::new(),
            next_seq: AtomicU64::new(0),
            writes: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Registers a listener. The store only keeps a weak reference to it.
    pub fn subscribe(&self, listener: Weak<dyn MutationListener>) {
        self.listeners.write().push(listener);
    }

    pub fn get(&self, id: &str) -> Option<Book> {
        self.books.get(id).map(|stored| stored.book.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.books.contains_key(id)
    }

    pub fn list(&self) -> Vec<Book> {
        let mut entries: Vec<(u64, Book)> = self
            .books
            .iter()
            .map(|entry| (entry.seq, entry.book.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, book)| book).collect()
    }

    pub fn create(&self, new_book: NewBook) -> Result<Book, StoreError> {
        let _write = self.writes.lock();

        let book = into_book(new_book, now_ms())?;
        validate(&book)?;
        if self.books.contains_key(&book.id) {
            return Err(StoreError::Conflict(format!("book {}", book.id)));
        }
        self.insert(book.clone());

        tracing::debug!("Created book {} ({})", book.id, book.title);
        self.notify();
        Ok(book)
    }

    pub fn update(&self, id: &str, patch: BookPatch) -> Result<Book, StoreError> {
        let _write = self.writes.lock();

        let updated = {
            let mut stored = self
                .books
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("book {}", id)))?;
            let mut candidate = stored.book.clone();
            apply_patch(&mut candidate, patch);
            validate(&candidate)?;
            candidate.updated_at = now_ms();
            stored.book = candidate.clone();
            candidate
        };

        tracing::debug!("Updated book {}", id);
        self.notify();
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Book, StoreError> {
        let _write = self.writes.lock();

        let (_, stored) = self
            .books
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("book {}", id)))?;

        tracing::debug!("Deleted book {}", id);
        self.notify();
        Ok(stored.book)
    }

    /// Replaces the whole collection. Nothing changes if any book is invalid.
    pub fn bulk_load(&self, new_books: Vec<NewBook>) -> Result<Vec<Book>, StoreError> {
        let _write = self.writes.lock();

        let now = now_ms();
        let mut books = Vec::with_capacity(new_books.len());
        let mut seen = std::collections::HashSet::new();
        for new_book in new_books {
            let book = into_book(new_book, now)?;
            validate(&book)?;
            if !seen.insert(book.id.clone()) {
                return Err(StoreError::Conflict(format!("book {}", book.id)));
            }
            books.push(book);
        }

        self.books.clear();
        for book in books.iter().cloned() {
            self.insert(book);
        }

        tracing::info!("Bulk loaded {} books", books.len());
        self.notify();
        Ok(books)
    }

    /// Overwrites the aggregated rating of a book.
    pub fn set_rating(&self, id: &str, rating: f64) -> Result<Book, StoreError> {
        self.update(
            id,
            BookPatch {
                rating: Some(rating),
                ..BookPatch::default()
            },
        )
    }

    fn insert(&self, book: Book) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.books.insert(book.id.clone(), StoredBook { seq, book });
    }

    fn notify(&self) {
        let listeners: Vec<Arc<dyn MutationListener>> = {
            let mut registered = self.listeners.write();
            registered.retain(|listener| listener.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        if listeners.is_empty() {
            return;
        }

        let books = self.list();
        for listener in listeners {
            listener.on_books_changed(books.clone());
        }
    }
}

impl BookSource for BookStore {
    fn list_books(&self) -> Vec<Book> {
        self.list()
    }
}

fn into_book(new_book: NewBook, now: u64) -> Result<Book, StoreError> {
    let id = match new_book.id {
        Some(id) if id.trim().is_empty() => {
            return Err(StoreError::Invalid {
                field: "id",
                reason: "must not be blank".to_string(),
            });
        }
        Some(id) => id.trim().to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };

    Ok(Book {
        id,
        title: new_book.title.trim().to_string(),
        author: new_book.author.trim().to_string(),
        description: new_book.description,
        category: new_book.category,
        language: new_book.language,
        rating: new_book.rating,
        created_at: now,
        updated_at: now,
        extra: strip_managed(new_book.extra),
    })
}

fn apply_patch(book: &mut Book, patch: BookPatch) {
    if let Some(title) = patch.title {
        book.title = title.trim().to_string();
    }
    if let Some(author) = patch.author {
        book.author = author.trim().to_string();
    }
    if let Some(description) = patch.description {
        book.description = description;
    }
    if let Some(category) = patch.category {
        book.category = category;
    }
    if let Some(language) = patch.language {
        book.language = language;
    }
    if let Some(rating) = patch.rating {
        book.rating = rating;
    }
    merge_extra(&mut book.extra, patch.extra);
}

fn merge_extra(target: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in strip_managed(changes) {
        target.insert(key, value);
    }
}

/// Drops client-sent keys the store owns.
fn strip_managed(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in ["id", "createdAt", "updatedAt"] {
        extra.remove(key);
    }
    extra
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn validate(book: &Book) -> Result<(), StoreError> {
    let required = [
        ("title", &book.title),
        ("author", &book.author),
        ("category", &book.category),
        ("language", &book.language),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(StoreError::Invalid {
                field,
                reason: "must not be empty".to_string(),
            });
        }
    }

    if !book.rating.is_finite() || !(0.0..=5.0).contains(&book.rating) {
        return Err(StoreError::Invalid {
            field: "rating",
            reason: format!("{} is outside 0-5", book.rating),
        });
    }

    Ok(())
}
