//! Screen state record and its transitions.
//!
//! # Responsibility
//! - Hold the four pieces of screen state: posts, query, status, error.
//! - Change them only through [`ScreenState::apply`].
//!
//! # Invariants
//! - `filtered == filter_posts(posts, query)` after every transition.
//! - A failed fetch empties `posts` and sets the fixed error message.
//! - At most one refresh is in flight; stale refresh completions are dropped.

use crate::fetch::FetchResult;
use crate::model::post::Post;
use crate::search::title_filter::filter_posts;

/// User-facing message shown when a fetch fails.
pub const FETCH_ERROR_MESSAGE: &str = "Unable to fetch posts. Check your network connection.";

/// User-facing message shown when the filtered list is empty.
pub const EMPTY_LIST_MESSAGE: &str = "No posts found.";

/// Result of one fetch as seen by the reducer.
pub type FetchOutcome = FetchResult<Vec<Post>>;

/// Observable screen status.
///
/// `Refreshing` overlays the last `Ready`/`Error` content; the previous
/// posts stay visible until the refresh completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStatus {
    Loading,
    Ready,
    Error,
    Refreshing,
}

impl ScreenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Refreshing => "refreshing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Loading,
    Ready,
    Error,
}

/// Handle for one accepted refresh. Only the newest ticket may finish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

/// Inputs to the reducer.
#[derive(Debug)]
pub enum ScreenAction {
    /// Screen (re)mounted; initial load is about to start.
    Mounted,
    /// Initial fetch and persisted-query read have both resolved.
    InitialLoaded {
        fetched: FetchOutcome,
        restored_query: Option<String>,
    },
    QueryChanged(String),
    RefreshRequested,
    RefreshFinished {
        ticket: RefreshTicket,
        fetched: FetchOutcome,
    },
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEffect {
    None,
    /// Write the query through to durable storage without blocking.
    PersistQuery(String),
    /// Run a fetch and report back with `RefreshFinished { ticket, .. }`.
    StartRefresh(RefreshTicket),
}

#[derive(Debug, Clone)]
pub struct ScreenState {
    posts: Vec<Post>,
    query: String,
    filtered: Vec<Post>,
    phase: LoadPhase,
    refreshing: bool,
    error: Option<&'static str>,
    /// Set by a query change after the last `Mounted`. Reachable when the
    /// host types while the initial load runs outside its screen lock.
    query_edited: bool,
    generation: u64,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenState {
    /// Initial state: loading, no posts, empty query.
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            query: String::new(),
            filtered: Vec::new(),
            phase: LoadPhase::Loading,
            refreshing: false,
            error: None,
            query_edited: false,
            generation: 0,
        }
    }

    /// Applies one transition and returns the follow-up work, if any.
    pub fn apply(&mut self, action: ScreenAction) -> ScreenEffect {
        match action {
            ScreenAction::Mounted => {
                self.phase = LoadPhase::Loading;
                self.refreshing = false;
                self.error = None;
                self.query_edited = false;
                // Invalidate any refresh still running from a previous mount.
                self.generation += 1;
                ScreenEffect::None
            }
            ScreenAction::InitialLoaded {
                fetched,
                restored_query,
            } => {
                if self.phase != LoadPhase::Loading {
                    return ScreenEffect::None;
                }
                // A query typed while loading wins over the restored one.
                if !self.query_edited {
                    self.query = restored_query.unwrap_or_default();
                }
                self.accept_fetch(fetched);
                ScreenEffect::None
            }
            ScreenAction::QueryChanged(query) => {
                self.query = query;
                self.query_edited = true;
                self.refilter();
                ScreenEffect::PersistQuery(self.query.clone())
            }
            ScreenAction::RefreshRequested => {
                if self.phase == LoadPhase::Loading || self.refreshing {
                    return ScreenEffect::None;
                }
                self.refreshing = true;
                self.generation += 1;
                ScreenEffect::StartRefresh(RefreshTicket {
                    generation: self.generation,
                })
            }
            ScreenAction::RefreshFinished { ticket, fetched } => {
                if !self.refreshing || ticket.generation != self.generation {
                    return ScreenEffect::None;
                }
                self.refreshing = false;
                self.accept_fetch(fetched);
                ScreenEffect::None
            }
        }
    }

    pub fn status(&self) -> ScreenStatus {
        match (self.phase, self.refreshing) {
            (LoadPhase::Loading, _) => ScreenStatus::Loading,
            (_, true) => ScreenStatus::Refreshing,
            (LoadPhase::Ready, false) => ScreenStatus::Ready,
            (LoadPhase::Error, false) => ScreenStatus::Error,
        }
    }

    /// All posts from the last successful fetch.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Posts currently displayed.
    pub fn filtered(&self) -> &[Post] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error
    }

    /// Bumped by every mount and accepted refresh.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Whether the empty-list indicator should be shown.
    ///
    /// Only a loaded, error-free screen can be "empty"; the error view
    /// replaces the list entirely.
    pub fn is_empty(&self) -> bool {
        self.phase == LoadPhase::Ready && self.filtered.is_empty()
    }

    fn accept_fetch(&mut self, fetched: FetchOutcome) {
        match fetched {
            Ok(posts) => {
                self.posts = posts;
                self.phase = LoadPhase::Ready;
                self.error = None;
            }
            Err(_) => {
                self.posts.clear();
                self.phase = LoadPhase::Error;
                self.error = Some(FETCH_ERROR_MESSAGE);
            }
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = filter_posts(&self.posts, &self.query);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ScreenAction, ScreenEffect, ScreenState, ScreenStatus, EMPTY_LIST_MESSAGE,
        FETCH_ERROR_MESSAGE,
    };
    use crate::fetch::FetchError;
    use crate::model::post::Post;

    fn two_posts() -> Vec<Post> {
        vec![
            Post::new(1, "Hello World", "x"),
            Post::new(2, "Another Post", "y"),
        ]
    }

    fn loaded(query: Option<&str>) -> ScreenState {
        let mut state = ScreenState::new();
        state.apply(ScreenAction::Mounted);
        state.apply(ScreenAction::InitialLoaded {
            fetched: Ok(two_posts()),
            restored_query: query.map(str::to_string),
        });
        state
    }

    fn failed() -> FetchError {
        FetchError::Status { status: 503 }
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|post| post.id).collect()
    }

    #[test]
    fn starts_loading() {
        let state = ScreenState::new();
        assert_eq!(state.status(), ScreenStatus::Loading);
        assert!(state.filtered().is_empty());
        assert!(!state.is_empty());
    }

    #[test]
    fn initial_load_applies_restored_query() {
        let state = loaded(Some("world"));
        assert_eq!(state.status(), ScreenStatus::Ready);
        assert_eq!(state.query(), "world");
        assert_eq!(ids(state.filtered()), vec![1]);
    }

    #[test]
    fn initial_load_without_restored_query_shows_all() {
        let state = loaded(None);
        assert_eq!(state.query(), "");
        assert_eq!(ids(state.filtered()), vec![1, 2]);
    }

    #[test]
    fn initial_fetch_failure_sets_fixed_message_and_empties_posts() {
        let mut state = ScreenState::new();
        state.apply(ScreenAction::Mounted);
        state.apply(ScreenAction::InitialLoaded {
            fetched: Err(failed()),
            restored_query: Some("hello".to_string()),
        });

        assert_eq!(state.status(), ScreenStatus::Error);
        assert_eq!(state.error_message(), Some(FETCH_ERROR_MESSAGE));
        assert!(state.posts().is_empty());
        assert!(state.filtered().is_empty());
        assert!(!state.is_empty(), "error view replaces the empty indicator");
        assert_eq!(state.query(), "hello");
    }

    #[test]
    fn query_change_refilters_and_requests_persist() {
        let mut state = loaded(None);
        let effect = state.apply(ScreenAction::QueryChanged("hello".to_string()));

        assert_eq!(effect, ScreenEffect::PersistQuery("hello".to_string()));
        assert_eq!(ids(state.filtered()), vec![1]);
    }

    #[test]
    fn unmatched_query_shows_empty_indicator() {
        let mut state = loaded(None);
        state.apply(ScreenAction::QueryChanged("xyz".to_string()));
        assert!(state.filtered().is_empty());
        assert!(state.is_empty());
        assert_eq!(EMPTY_LIST_MESSAGE, "No posts found.");
    }

    #[test]
    fn query_typed_during_loading_survives_initial_load() {
        let mut state = ScreenState::new();
        state.apply(ScreenAction::Mounted);
        state.apply(ScreenAction::QueryChanged("another".to_string()));
        state.apply(ScreenAction::InitialLoaded {
            fetched: Ok(two_posts()),
            restored_query: Some("world".to_string()),
        });

        assert_eq!(state.query(), "another");
        assert_eq!(ids(state.filtered()), vec![2]);
    }

    #[test]
    fn refresh_overlays_previous_content_and_reapplies_query() {
        let mut state = loaded(Some("post"));
        let ScreenEffect::StartRefresh(ticket) = state.apply(ScreenAction::RefreshRequested)
        else {
            panic!("refresh should start");
        };
        assert_eq!(state.status(), ScreenStatus::Refreshing);
        assert_eq!(ids(state.filtered()), vec![2]);

        state.apply(ScreenAction::RefreshFinished {
            ticket,
            fetched: Ok(vec![
                Post::new(10, "New Post", "a"),
                Post::new(11, "Unrelated", "b"),
                Post::new(12, "post script", "c"),
            ]),
        });

        assert_eq!(state.status(), ScreenStatus::Ready);
        assert_eq!(ids(state.filtered()), vec![10, 12]);
    }

    #[test]
    fn refresh_failure_replaces_content_with_error() {
        let mut state = loaded(None);
        let ScreenEffect::StartRefresh(ticket) = state.apply(ScreenAction::RefreshRequested)
        else {
            panic!("refresh should start");
        };
        state.apply(ScreenAction::RefreshFinished {
            ticket,
            fetched: Err(failed()),
        });

        assert_eq!(state.status(), ScreenStatus::Error);
        assert!(state.posts().is_empty());

        let ScreenEffect::StartRefresh(ticket) = state.apply(ScreenAction::RefreshRequested)
        else {
            panic!("refresh from error should start");
        };
        state.apply(ScreenAction::RefreshFinished {
            ticket,
            fetched: Ok(two_posts()),
        });
        assert_eq!(state.status(), ScreenStatus::Ready);
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn refresh_is_ignored_while_loading_or_refreshing() {
        let mut state = ScreenState::new();
        state.apply(ScreenAction::Mounted);
        assert_eq!(
            state.apply(ScreenAction::RefreshRequested),
            ScreenEffect::None
        );

        let mut state = loaded(None);
        assert!(matches!(
            state.apply(ScreenAction::RefreshRequested),
            ScreenEffect::StartRefresh(_)
        ));
        assert_eq!(
            state.apply(ScreenAction::RefreshRequested),
            ScreenEffect::None
        );
    }

    #[test]
    fn stale_refresh_completion_is_dropped() {
        let mut state = loaded(None);
        let ScreenEffect::StartRefresh(stale) = state.apply(ScreenAction::RefreshRequested)
        else {
            panic!("refresh should start");
        };

        // Remount invalidates the in-flight refresh.
        state.apply(ScreenAction::Mounted);
        state.apply(ScreenAction::InitialLoaded {
            fetched: Ok(two_posts()),
            restored_query: None,
        });
        state.apply(ScreenAction::RefreshFinished {
            ticket: stale,
            fetched: Ok(vec![Post::new(99, "Stale", "s")]),
        });

        assert_eq!(state.status(), ScreenStatus::Ready);
        assert_eq!(ids(state.posts()), vec![1, 2]);
    }
}
