//! Posts screen driver.
//!
//! # Responsibility
//! - Run the initial fetch and the persisted-query read concurrently and
//!   join them before filtering.
//! - Apply query changes synchronously and persist them in the background.
//! - Run manual refreshes, one at a time.
//! - Let hosts split mount and refresh around their own locking.
//!
//! # Invariants
//! - Screen state is only mutated through [`ScreenState::apply`].
//! - Query persistence never blocks or fails a query change.

use crate::fetch::PostFetcher;
use crate::model::screen::{FetchOutcome, RefreshTicket, ScreenAction, ScreenEffect, ScreenState};
use crate::repo::query_store::QueryStore;
use crate::service::query_writer::{FlushHandle, QueryWriter};
use log::{debug, info, warn};
use std::sync::Arc;

/// Owns screen state and the collaborators that feed it.
pub struct PostScreen<F: PostFetcher, S: QueryStore> {
    fetcher: Arc<F>,
    store: Arc<S>,
    state: ScreenState,
    writer: QueryWriter,
}

impl<F: PostFetcher, S: QueryStore> PostScreen<F, S> {
    /// Creates a screen in `Loading` state and starts its query writer.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(fetcher: F, store: S) -> Self {
        let store = Arc::new(store);
        Self {
            fetcher: Arc::new(fetcher),
            writer: QueryWriter::spawn(Arc::clone(&store)),
            store,
            state: ScreenState::new(),
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Shared handle to the fetcher, for hosts that run refresh fetches
    /// outside their lock on the screen.
    pub fn fetcher(&self) -> Arc<F> {
        Arc::clone(&self.fetcher)
    }

    /// Loads posts and the persisted query, then shows the filtered list.
    ///
    /// Both reads start together; filtering waits for both regardless of
    /// which finishes first.
    pub async fn mount(&mut self) -> &ScreenState {
        let loaded = self.begin_mount().load().await;
        self.finish_mount(loaded)
    }

    /// Enters `Loading` and hands back the reads the mount still needs.
    ///
    /// The returned [`PendingMount`] borrows nothing from the screen, so a
    /// host can run it while other calls keep using the screen.
    pub fn begin_mount(&mut self) -> PendingMount<F, S> {
        // A remount must read back the newest query, not one still queued.
        let flushed = self.writer.request_flush();
        self.state.apply(ScreenAction::Mounted);
        info!("event=screen_mount module=service status=start");
        PendingMount {
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            flushed,
            generation: self.state.generation(),
        }
    }

    /// Applies the result of a [`PendingMount`].
    ///
    /// Results of a mount superseded by a later one are discarded.
    pub fn finish_mount(&mut self, loaded: LoadedMount) -> &ScreenState {
        if loaded.generation != self.state.generation() {
            info!("event=screen_mount module=service status=ignored reason=superseded");
            return &self.state;
        }
        self.state.apply(ScreenAction::InitialLoaded {
            fetched: loaded.fetched,
            restored_query: loaded.restored_query,
        });
        log_settled("screen_mount", &self.state);
        &self.state
    }

    /// Updates the query, re-filters, and queues a durable write.
    pub fn set_query(&mut self, query: impl Into<String>) -> &ScreenState {
        if let ScreenEffect::PersistQuery(value) =
            self.state.apply(ScreenAction::QueryChanged(query.into()))
        {
            debug!(
                "event=query_change module=service status=ok query_len={} visible={}",
                value.chars().count(),
                self.state.filtered().len()
            );
            self.writer.submit(value);
        }
        &self.state
    }

    /// Re-fetches posts and re-applies the current query.
    ///
    /// Returns `false` without fetching when the initial load or another
    /// refresh is still in flight.
    pub async fn refresh(&mut self) -> bool {
        let Some(ticket) = self.begin_refresh() else {
            return false;
        };
        let fetched = self.fetcher.fetch().await;
        self.finish_refresh(ticket, fetched);
        true
    }

    /// Marks a refresh as started. `None` means the request was ignored.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        match self.state.apply(ScreenAction::RefreshRequested) {
            ScreenEffect::StartRefresh(ticket) => {
                info!("event=screen_refresh module=service status=start");
                Some(ticket)
            }
            _ => {
                info!("event=screen_refresh module=service status=ignored reason=in_flight");
                None
            }
        }
    }

    /// Completes a refresh started by [`Self::begin_refresh`].
    ///
    /// Completions for superseded tickets are discarded by the reducer.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        fetched: FetchOutcome,
    ) -> &ScreenState {
        self.state
            .apply(ScreenAction::RefreshFinished { ticket, fetched });
        log_settled("screen_refresh", &self.state);
        &self.state
    }

    /// Waits until all queued query writes have been attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Flushes pending writes and stops the background writer.
    pub async fn shutdown(self) {
        self.writer.shutdown().await;
    }
}

/// Initial reads for one mount, detached from the screen.
pub struct PendingMount<F: PostFetcher, S: QueryStore> {
    fetcher: Arc<F>,
    store: Arc<S>,
    flushed: FlushHandle,
    generation: u64,
}

impl<F: PostFetcher, S: QueryStore> PendingMount<F, S> {
    /// Fetches posts and reads the persisted query concurrently.
    ///
    /// The store read waits for queued writes first; the fetch does not.
    pub async fn load(self) -> LoadedMount {
        let Self {
            fetcher,
            store,
            flushed,
            generation,
        } = self;
        let restore = async move {
            flushed.wait().await;
            load_query(store).await
        };
        let (fetched, restored_query) = tokio::join!(fetcher.fetch(), restore);
        LoadedMount {
            fetched,
            restored_query,
            generation,
        }
    }
}

/// Joined initial reads, ready for [`PostScreen::finish_mount`].
#[derive(Debug)]
pub struct LoadedMount {
    fetched: FetchOutcome,
    restored_query: Option<String>,
    generation: u64,
}

async fn load_query<S: QueryStore>(store: Arc<S>) -> Option<String> {
    match tokio::task::spawn_blocking(move || store.load()).await {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            warn!("event=query_load module=service status=error error_code=store_read_failed error={err}");
            None
        }
        Err(err) => {
            warn!("event=query_load module=service status=error error_code=store_task_failed error={err}");
            None
        }
    }
}

fn log_settled(event: &str, state: &ScreenState) {
    info!(
        "event={event} module=service status=ok screen={} posts={} visible={}",
        state.status().as_str(),
        state.posts().len(),
        state.filtered().len()
    );
}
