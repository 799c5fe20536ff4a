use super::types::{NewReview, Review, ReviewPatch};
use crate::storage::memory::{BookStore, now_ms};
use crate::storage::types::StoreError;

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

struct StoredReview {
    seq: u64,
    review: Review,
}

pub struct ReviewStore {
    reviews: DashMap<String, StoredReview>,
    books: Arc<BookStore>,
    next_seq: AtomicU64,
    writes: Mutex<()>,
}

impl ReviewStore {
    pub fn new(books: Arc<BookStore>) -> Arc<Self> {
        Arc::new(Self {
            reviews: DashMap::new(),
            books,
            next_seq: AtomicU64::new(0),
            writes: Mutex::new(()),
        })
    }

    /// Reviews of one book, oldest first.
    pub fn list_for_book(&self, book_id: &str) -> Result<Vec<Review>, StoreError> {
        if !self.books.contains(book_id) {
            return Err(StoreError::NotFound(format!("book {}", book_id)));
        }

        let mut entries: Vec<(u64, Review)> = self
            .reviews
            .iter()
            .filter(|entry| entry.review.book_id == book_id)
            .map(|entry| (entry.seq, entry.review.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, review)| review).collect())
    }

    pub fn create(&self, req: NewReview) -> Result<Review, StoreError> {
        let _write = self.writes.lock();

        if !self.books.contains(&req.book_id) {
            return Err(StoreError::NotFound(format!("book {}", req.book_id)));
        }
        validate_rating(req.rating)?;
        let reviewer_name = non_blank("reviewerName", req.reviewer_name)?;
        let comment = non_blank("comment", req.comment)?;

        let now = now_ms();
        let review = Review {
            id: uuid::Uuid::new_v4().to_string(),
            book_id: req.book_id,
            reviewer_name,
            rating: req.rating,
            comment,
            created_at: now,
            updated_at: now,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.reviews.insert(
            review.id.clone(),
            StoredReview {
                seq,
                review: review.clone(),
            },
        );

        self.refresh_book_rating(&review.book_id)?;
        Ok(review)
    }

    pub fn update(&self, id: &str, patch: ReviewPatch) -> Result<Review, StoreError> {
        let _write = self.writes.lock();

        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }
        let comment = patch
            .comment
            .map(|c| non_blank("comment", c))
            .transpose()?;

        let updated = {
            let mut stored = self
                .reviews
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("review {}", id)))?;
            if let Some(rating) = patch.rating {
                stored.review.rating = rating;
            }
            if let Some(comment) = comment {
                stored.review.comment = comment;
            }
            stored.review.updated_at = now_ms();
            stored.review.clone()
        };

        self.refresh_book_rating(&updated.book_id)?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Review, StoreError> {
        let _write = self.writes.lock();

        let (_, stored) = self
            .reviews
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("review {}", id)))?;

        self.refresh_book_rating(&stored.review.book_id)?;
        Ok(stored.review)
    }

    /// Mean review rating of a book, rounded to one decimal. 0 without reviews.
    pub fn average_rating(&self, book_id: &str) -> f64 {
        let (sum, count) = self
            .reviews
            .iter()
            .filter(|entry| entry.review.book_id == book_id)
            .fold((0u64, 0u64), |(sum, count), entry| {
                (sum + u64::from(entry.review.rating), count + 1)
            });

        if count == 0 {
            return 0.0;
        }
        let mean = sum as f64 / count as f64;
        (mean * 10.0).round() / 10.0
    }

    fn refresh_book_rating(&self, book_id: &str) -> Result<(), StoreError> {
        let rating = self.average_rating(book_id);
        match self.books.set_rating(book_id, rating) {
            Ok(_) => {
                tracing::debug!("Book {} rating is now {}", book_id, rating);
                Ok(())
            }
            // Reviews of a deleted book are orphaned.
            Err(StoreError::NotFound(_)) => {
                tracing::warn!("Review refers to missing book {}", book_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn validate_rating(rating: u8) -> Result<(), StoreError> {
    if !(1..=5).contains(&rating) {
        return Err(StoreError::Invalid {
            field: "rating",
            reason: format!("{} is outside 1-5", rating),
        });
    }
    Ok(())
}

fn non_blank(field: &'static str, value: String) -> Result<String, StoreError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(StoreError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}
