use async_trait::async_trait;
use postfeed_core::{
    FetchError, FetchResult, MemoryQueryStore, Post, PostFetcher, PostScreen, QueryStore,
    ScreenStatus, SqliteQueryStore, StoreResult, FETCH_ERROR_MESSAGE,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns queued responses in order; each fetch waits `delay` first.
struct ScriptedFetcher {
    responses: Mutex<VecDeque<FetchResult<Vec<Post>>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<FetchResult<Vec<Post>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PostFetcher for ScriptedFetcher {
    async fn fetch(&self) -> FetchResult<Vec<Post>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected extra fetch")
    }
}

/// Memory store whose reads block for a while.
struct SlowStore {
    inner: MemoryQueryStore,
    delay: Duration,
}

impl QueryStore for SlowStore {
    fn load(&self) -> StoreResult<Option<String>> {
        std::thread::sleep(self.delay);
        self.inner.load()
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        self.inner.save(value)
    }

    fn clear(&self) -> StoreResult<()> {
        self.inner.clear()
    }
}

fn two_posts() -> Vec<Post> {
    vec![
        Post::new(1, "Hello World", "x"),
        Post::new(2, "Another Post", "y"),
    ]
}

fn network_error() -> FetchError {
    FetchError::Status { status: 502 }
}

fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id).collect()
}

#[tokio::test]
async fn typing_hello_filters_to_matching_post() {
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts())]),
        MemoryQueryStore::new(),
    );
    screen.mount().await;

    let state = screen.set_query("hello");
    assert_eq!(ids(state.filtered()), vec![1]);
    screen.shutdown().await;
}

#[tokio::test]
async fn failed_initial_fetch_shows_fixed_error() {
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Err(network_error())]),
        MemoryQueryStore::new(),
    );

    let state = screen.mount().await;
    assert_eq!(state.status(), ScreenStatus::Error);
    assert_eq!(
        state.error_message(),
        Some("Unable to fetch posts. Check your network connection.")
    );
    assert_eq!(state.error_message(), Some(FETCH_ERROR_MESSAGE));
    assert!(state.posts().is_empty());
    screen.shutdown().await;
}

#[tokio::test]
async fn restored_query_is_applied_to_initial_list() {
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts())]),
        MemoryQueryStore::with_value("world"),
    );

    let state = screen.mount().await;
    assert_eq!(state.status(), ScreenStatus::Ready);
    assert_eq!(state.query(), "world");
    assert_eq!(ids(state.filtered()), vec![1]);
    screen.shutdown().await;
}

#[tokio::test]
async fn restored_query_waits_for_slow_store_read() {
    let store = SlowStore {
        inner: MemoryQueryStore::with_value("another"),
        delay: Duration::from_millis(150),
    };
    let mut screen = PostScreen::new(ScriptedFetcher::new(vec![Ok(two_posts())]), store);

    let state = screen.mount().await;
    assert_eq!(ids(state.filtered()), vec![2]);
    screen.shutdown().await;
}

#[tokio::test]
async fn restored_query_waits_for_slow_fetch() {
    let fetcher =
        ScriptedFetcher::new(vec![Ok(two_posts())]).delayed(Duration::from_millis(150));
    let mut screen = PostScreen::new(fetcher, MemoryQueryStore::with_value("hello"));

    let state = screen.mount().await;
    assert_eq!(state.query(), "hello");
    assert_eq!(ids(state.filtered()), vec![1]);
    screen.shutdown().await;
}

#[tokio::test]
async fn unmatched_query_is_empty_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts())]),
        SqliteQueryStore::new(&path),
    );
    screen.mount().await;

    let state = screen.set_query("xyz");
    assert!(state.filtered().is_empty());
    assert!(state.is_empty());

    screen.flush().await;
    assert_eq!(
        SqliteQueryStore::new(&path).load().unwrap().as_deref(),
        Some("xyz")
    );
    screen.shutdown().await;
}

#[tokio::test]
async fn persisted_query_restores_on_next_launch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let mut first = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts())]),
        SqliteQueryStore::new(&path),
    );
    first.mount().await;
    first.set_query("h");
    first.set_query("he");
    first.set_query("another");
    first.shutdown().await;

    let mut second = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts())]),
        SqliteQueryStore::new(&path),
    );
    let state = second.mount().await;
    assert_eq!(state.query(), "another");
    assert_eq!(ids(state.filtered()), vec![2]);
    second.shutdown().await;
}

#[tokio::test]
async fn refresh_reapplies_current_query_to_new_posts() {
    let refreshed = vec![
        Post::new(3, "Hello again", "a"),
        Post::new(4, "Goodbye", "b"),
        Post::new(5, "say hello", "c"),
    ];
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Ok(two_posts()), Ok(refreshed)]),
        MemoryQueryStore::new(),
    );
    screen.mount().await;
    screen.set_query("hello");
    assert_eq!(ids(screen.state().filtered()), vec![1]);

    assert!(screen.refresh().await);
    let state = screen.state();
    assert_eq!(state.status(), ScreenStatus::Ready);
    assert_eq!(state.query(), "hello");
    assert_eq!(ids(state.posts()), vec![3, 4, 5]);
    assert_eq!(ids(state.filtered()), vec![3, 5]);
    screen.shutdown().await;
}

#[tokio::test]
async fn refresh_recovers_from_error() {
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Err(network_error()), Ok(two_posts())]),
        MemoryQueryStore::new(),
    );
    assert_eq!(screen.mount().await.status(), ScreenStatus::Error);

    assert!(screen.refresh().await);
    assert_eq!(screen.state().status(), ScreenStatus::Ready);
    assert_eq!(screen.state().error_message(), None);
    assert_eq!(ids(screen.state().filtered()), vec![1, 2]);
    screen.shutdown().await;
}

#[tokio::test]
async fn second_refresh_while_in_flight_is_ignored() {
    let fetcher = ScriptedFetcher::new(vec![Ok(two_posts()), Ok(vec![])]);
    let calls = Arc::clone(&fetcher.calls);
    let mut screen = PostScreen::new(fetcher, MemoryQueryStore::new());
    screen.mount().await;

    let ticket = screen.begin_refresh().expect("first refresh should start");
    assert_eq!(screen.state().status(), ScreenStatus::Refreshing);
    assert!(screen.begin_refresh().is_none());
    assert!(!screen.refresh().await);

    let fetched = screen.fetcher().fetch().await;
    screen.finish_refresh(ticket, fetched);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(screen.state().status(), ScreenStatus::Ready);
    assert!(screen.state().is_empty());
    screen.shutdown().await;
}

#[tokio::test]
async fn query_typed_during_split_mount_wins_over_restored_one() {
    let fetcher = ScriptedFetcher::new(vec![Ok(two_posts())]).delayed(Duration::from_millis(100));
    let calls = Arc::clone(&fetcher.calls);
    let mut screen = PostScreen::new(fetcher, MemoryQueryStore::with_value("world"));

    let pending = screen.begin_mount();
    assert_eq!(screen.state().status(), ScreenStatus::Loading);
    let typed = screen.set_query("another");
    assert_eq!(typed.status(), ScreenStatus::Loading);
    assert_eq!(typed.query(), "another");
    assert!(screen.begin_refresh().is_none());

    let loaded = pending.load().await;
    let state = screen.finish_mount(loaded);
    assert_eq!(state.status(), ScreenStatus::Ready);
    assert_eq!(state.query(), "another");
    assert_eq!(ids(state.filtered()), vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    screen.shutdown().await;
}

#[tokio::test]
async fn superseded_mount_result_is_dropped() {
    let mut screen = PostScreen::new(
        ScriptedFetcher::new(vec![Err(network_error()), Ok(two_posts())]),
        MemoryQueryStore::new(),
    );

    let first = screen.begin_mount();
    let second = screen.begin_mount();
    let first = first.load().await;
    let second = second.load().await;

    screen.finish_mount(second);
    let state = screen.finish_mount(first);
    assert_eq!(state.status(), ScreenStatus::Ready);
    assert_eq!(ids(state.filtered()), vec![1, 2]);
    screen.shutdown().await;
}
