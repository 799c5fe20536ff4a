//! Book Reviews Module
//!
//! Reader reviews and the rating aggregation they drive.
//!
//! ## Workflow
//! 1. **Create**: A review is accepted only for a book that exists in the `BookStore`.
//! 2. **Aggregate**: After every create, update or delete the book's rating is set to the
//!    mean of its review ratings, rounded to one decimal (0 when it has no reviews).
//! 3. **Propagate**: The rating change is a regular store write, so the search index is
//!    rebuilt through the store's mutation notification.

pub mod handlers;
pub mod store;
pub mod types;
