//! Digital Library Backend
//!
//! Book catalogue, reader reviews, and an in-process fuzzy search engine over the catalogue.
//!
//! ## Architecture Modules
//! - **`storage`**: The in-memory book collection with CRUD, bulk loading and change
//!   notification. It is the single source of truth for book data.
//! - **`search`**: Typo-tolerant weighted search. Owns an immutable index rebuilt on every
//!   collection change and a TTL cache of query results that is flushed with each rebuild.
//! - **`reviews`**: Reader reviews. Each review change recomputes the reviewed book's rating.
//! - **`config`**: Server flags and search tuning.
//! - **`app`**: The Axum router exposing all of the above over HTTP.

pub mod app;
pub mod config;
pub mod reviews;
pub mod search;
pub mod storage;
