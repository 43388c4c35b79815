//! Core logic for the Postfeed posts screen.
//! Fetching, filtering, query persistence and screen state live here; hosts
//! only render.

pub mod config;
pub mod db;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, PostfeedConfig};
pub use fetch::{FetchError, FetchResult, HttpPostFetcher, PostFetcher, DEFAULT_POSTS_ENDPOINT};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::post::{Post, PostId};
pub use model::screen::{
    FetchOutcome, RefreshTicket, ScreenAction, ScreenEffect, ScreenState, ScreenStatus,
    EMPTY_LIST_MESSAGE, FETCH_ERROR_MESSAGE,
};
pub use repo::query_store::{
    MemoryQueryStore, QueryStore, SqliteQueryStore, StoreError, StoreResult, SEARCH_QUERY_KEY,
};
pub use search::title_filter::{filter_posts, title_matches};
pub use service::post_screen::{LoadedMount, PendingMount, PostScreen};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
