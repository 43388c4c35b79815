//! Durable storage for the last search text.
//!
//! # Responsibility
//! - Define the single-key query store contract.
//! - Keep SQLite details behind that contract.
//!
//! # Invariants
//! - Exactly one key is read and written: [`query_store::SEARCH_QUERY_KEY`].
//! - An absent key reads as `None`, never as an empty string.

pub mod query_store;
