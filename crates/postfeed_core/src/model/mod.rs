//! Domain model for the posts screen.
//!
//! # Responsibility
//! - Define the remote post record as the core sees it.
//! - Own the screen state record and its reducer-style transitions.
//!
//! # Invariants
//! - Posts are read-only snapshots replaced wholesale on every fetch.
//! - The filtered view is always `filter_posts(posts, query)`.

pub mod post;
pub mod screen;
