//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the posts screen to Dart via FRB as plain envelopes.
//! - Own the process-wide screen instance and the runtime that drives it.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Screen state is only touched while holding the screen lock; network
//!   fetches for mount and refresh run outside it so typing never waits
//!   on I/O.

use log::warn;
use postfeed_core::{
    core_version as core_version_inner, filter_posts as filter_posts_inner,
    init_logging as init_logging_inner, ping as ping_inner, HttpPostFetcher, Post, PostFetcher,
    PostScreen, PostfeedConfig, ScreenState, ScreenStatus, SqliteQueryStore, EMPTY_LIST_MESSAGE,
};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tokio::runtime::{Builder, Runtime};

type EntryScreen = PostScreen<HttpPostFetcher, SqliteQueryStore>;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static SCREEN: Mutex<Option<EntryScreen>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One post row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostItem {
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// Everything the Dart side needs to render the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    /// `loading|ready|error|refreshing`.
    pub status: String,
    /// Current search text.
    pub query: String,
    /// Posts to display, already filtered.
    pub items: Vec<PostItem>,
    /// Fixed user-facing fetch error; replaces the list when set.
    pub error_message: Option<String>,
    /// Empty-list indicator text when the filtered list is empty.
    pub empty_message: Option<String>,
    /// Diagnostics for host-side failures (empty when none).
    pub message: String,
}

impl ScreenSnapshot {
    fn from_state(state: &ScreenState) -> Self {
        Self {
            status: state.status().as_str().to_string(),
            query: state.query().to_string(),
            items: state.filtered().iter().map(to_post_item).collect(),
            error_message: state.error_message().map(str::to_string),
            empty_message: state.is_empty().then(|| EMPTY_LIST_MESSAGE.to_string()),
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ScreenStatus::Error.as_str().to_string(),
            query: String::new(),
            items: Vec::new(),
            error_message: None,
            empty_message: None,
            message: message.into(),
        }
    }
}

/// Filters caller-held posts by title.
///
/// # FFI contract
/// - Sync call, pure, never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn filter_posts(items: Vec<PostItem>, query: String) -> Vec<PostItem> {
    let posts = items.into_iter().map(from_post_item).collect::<Vec<_>>();
    filter_posts_inner(&posts, &query)
        .iter()
        .map(to_post_item)
        .collect()
}

/// Mounts (or remounts) the screen: fetches posts and restores the query.
///
/// Configuration comes from `POSTFEED_*` environment variables on first
/// mount.
///
/// # FFI contract
/// - Async from Dart; blocks a worker thread for the network round-trip.
/// - The screen lock is released during the fetch, so query changes and
///   snapshots stay responsive and refreshes are ignored until it settles.
/// - Never panics; failures come back as `message`.
pub fn screen_mount() -> ScreenSnapshot {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(message) => return ScreenSnapshot::failure(message),
    };

    let pending = {
        let mut guard = match lock_screen() {
            Ok(guard) => guard,
            Err(message) => return ScreenSnapshot::failure(message),
        };
        if guard.is_none() {
            match build_screen(runtime) {
                Ok(screen) => *guard = Some(screen),
                Err(message) => return ScreenSnapshot::failure(message),
            }
        }
        match guard.as_mut() {
            Some(screen) => screen.begin_mount(),
            None => return ScreenSnapshot::failure("screen_mount failed: screen unavailable"),
        }
    };

    let loaded = runtime.block_on(pending.load());

    with_mounted_screen("screen_mount", |screen| {
        ScreenSnapshot::from_state(screen.finish_mount(loaded))
    })
    .unwrap_or_else(|snapshot| snapshot)
}

/// Applies a search text change and persists it in the background.
///
/// # FFI contract
/// - Sync call; never waits on network or storage.
#[flutter_rust_bridge::frb(sync)]
pub fn screen_set_query(query: String) -> ScreenSnapshot {
    with_mounted_screen("screen_set_query", |screen| {
        ScreenSnapshot::from_state(screen.set_query(query))
    })
    .unwrap_or_else(|snapshot| snapshot)
}

/// Returns the current screen state without changing it.
#[flutter_rust_bridge::frb(sync)]
pub fn screen_snapshot() -> ScreenSnapshot {
    with_mounted_screen("screen_snapshot", |screen| {
        ScreenSnapshot::from_state(screen.state())
    })
    .unwrap_or_else(|snapshot| snapshot)
}

/// Re-fetches posts and re-applies the current query.
///
/// A refresh requested while another is in flight returns the current
/// snapshot unchanged.
///
/// # FFI contract
/// - Async from Dart; the screen lock is released during the fetch.
pub fn screen_refresh() -> ScreenSnapshot {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(message) => return ScreenSnapshot::failure(message),
    };

    let started = with_mounted_screen("screen_refresh", |screen| match screen.begin_refresh() {
        Some(ticket) => Ok((ticket, screen.fetcher())),
        None => Err(ScreenSnapshot::from_state(screen.state())),
    });
    let (ticket, fetcher) = match started {
        Ok(Ok(started)) => started,
        Ok(Err(snapshot)) | Err(snapshot) => return snapshot,
    };

    let fetched = runtime.block_on(fetcher.fetch());

    with_mounted_screen("screen_refresh", |screen| {
        ScreenSnapshot::from_state(screen.finish_refresh(ticket, fetched))
    })
    .unwrap_or_else(|snapshot| snapshot)
}

/// Runs `f` against the mounted screen; lock or mount problems come back
/// as a failure snapshot.
fn with_mounted_screen<T>(
    operation: &str,
    f: impl FnOnce(&mut EntryScreen) -> T,
) -> Result<T, ScreenSnapshot> {
    let mut guard = lock_screen()
        .map_err(|message| ScreenSnapshot::failure(format!("{operation} failed: {message}")))?;
    match guard.as_mut() {
        Some(screen) => Ok(f(screen)),
        None => Err(ScreenSnapshot::failure(format!(
            "{operation} failed: screen is not mounted"
        ))),
    }
}

fn lock_screen() -> Result<MutexGuard<'static, Option<EntryScreen>>, String> {
    SCREEN.lock().map_err(|_| {
        warn!("event=ffi_screen_lock module=ffi status=error error_code=lock_poisoned");
        "screen lock poisoned".to_string()
    })
}

fn runtime() -> Result<&'static Runtime, String> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("postfeed-io")
        .enable_all()
        .build()
        .map_err(|err| format!("runtime init failed: {err}"))?;
    Ok(RUNTIME.get_or_init(|| runtime))
}

fn build_screen(runtime: &Runtime) -> Result<EntryScreen, String> {
    let config = PostfeedConfig::from_env().map_err(|err| format!("config error: {err}"))?;
    let fetcher = HttpPostFetcher::new(config.endpoint, config.request_timeout)
        .map_err(|err| format!("fetcher init failed: {err}"))?;
    let store = SqliteQueryStore::new(config.store_path);

    // The query writer is spawned onto the current runtime.
    let _entered = runtime.enter();
    Ok(PostScreen::new(fetcher, store))
}

fn to_post_item(post: &Post) -> PostItem {
    PostItem {
        id: post.id,
        title: post.title.clone(),
        body: post.body.clone(),
    }
}

fn from_post_item(item: PostItem) -> Post {
    Post::new(item.id, item.title, item.body)
}
