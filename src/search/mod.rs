//! Search Service Module
//!
//! Typo-tolerant, weighted, multi-field search over the book library.
//!
//! ## Overview
//! The whole library is indexed in memory. A query is matched approximately against
//! the title, author, description, category and language of every book; per-field
//! scores are combined with fixed field weights into a single relevance score where
//! lower is better. Results are then filtered, truncated and cached.
//!
//! ## Submodules
//! - **`fuzzy`**: Bitap approximate matcher producing a score and highlight spans per field.
//! - **`index`**: Immutable index built from a snapshot of the library.
//! - **`engine`**: Scores and ranks every book of an index against a query.
//! - **`filter`**: Category / minimum rating / language constraints and result limits.
//! - **`cache`**: TTL cache of result lists, flushed on every rebuild.
//! - **`service`**: The facade owning index and cache; the only entry point for handlers.
//! - **`handlers`**: HTTP request handlers for the Axum web server.
//! - **`types`**: Book record, search options and response DTOs.

pub mod cache;
pub mod engine;
pub mod filter;
pub mod fuzzy;
pub mod handlers;
pub mod index;
pub mod service;
pub mod types;
