//! Screen use-case orchestration.
//!
//! # Responsibility
//! - Drive the screen reducer from fetch, store and user events.
//! - Keep FFI/CLI layers decoupled from fetch and storage details.

pub mod post_screen;
pub mod query_writer;
