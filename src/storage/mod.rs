//! Book Storage Module
//!
//! The document store the rest of the service treats as its persistence layer.
//!
//! ## Core Concepts
//! - **Collection**: `BookStore` keeps books in memory, listed in insertion order.
//! - **Validation**: Writes are rejected when required fields are blank or the rating is outside 0-5.
//! - **Notification**: Every successful write pushes the full book list to subscribed
//!   `MutationListener`s; this is how the search index stays in sync with the data.
//! - **Access**: `handlers` exposes CRUD and bulk loading over HTTP.

pub mod handlers;
pub mod memory;
pub mod types;

#[cfg(test)]
mod tests;
