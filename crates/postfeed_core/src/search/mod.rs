//! Title search over an in-memory post collection.
//!
//! # Responsibility
//! - Select posts by case-insensitive title substring.
//! - Stay pure: no I/O, no logging, no allocation beyond the result.

pub mod title_filter;
