//! Detached write-through of the search query.
//!
//! # Invariants
//! - Writes run on one background task, in submission order.
//! - Queued saves are coalesced; only the newest pending value is written.
//! - Write failures are logged and dropped; they never reach the caller.

use crate::repo::query_store::QueryStore;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum WriteCommand {
    Save(String),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer that persists query changes.
pub struct QueryWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    handle: JoinHandle<()>,
}

impl QueryWriter {
    /// Starts the writer on the blocking pool of the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn spawn<S: QueryStore>(store: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || run_writer(store.as_ref(), rx));
        Self { tx, handle }
    }

    /// Queues `value` for persistence and returns immediately.
    pub fn submit(&self, value: String) {
        if self.tx.send(WriteCommand::Save(value)).is_err() {
            warn!("event=query_save module=service status=error error_code=writer_stopped");
        }
    }

    /// Waits until every save submitted before this call has been attempted.
    pub async fn flush(&self) {
        self.request_flush().wait().await;
    }

    /// Queues a flush marker without waiting for it.
    ///
    /// The returned handle resolves once every save submitted before this
    /// call has been attempted, and can be awaited after `self` is gone.
    pub fn request_flush(&self) -> FlushHandle {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack)).is_err() {
            return FlushHandle(None);
        }
        FlushHandle(Some(done))
    }

    /// Flushes outstanding saves and stops the writer.
    pub async fn shutdown(self) {
        let Self { tx, handle } = self;
        drop(tx);
        if let Err(err) = handle.await {
            warn!("event=query_writer_stop module=service status=error error={err}");
        }
    }
}

/// Pending flush acknowledgement from [`QueryWriter::request_flush`].
#[derive(Debug)]
pub struct FlushHandle(Option<oneshot::Receiver<()>>);

impl FlushHandle {
    /// Resolves immediately when the writer had already stopped.
    pub async fn wait(self) {
        if let Some(done) = self.0 {
            let _ = done.await;
        }
    }
}

fn run_writer<S: QueryStore + ?Sized>(
    store: &S,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(first) = rx.blocking_recv() {
        let mut latest = None;
        let mut acks = Vec::new();
        let mut absorb = |command| match command {
            WriteCommand::Save(value) => latest = Some(value),
            WriteCommand::Flush(ack) => acks.push(ack),
        };

        absorb(first);
        while let Ok(command) = rx.try_recv() {
            absorb(command);
        }

        if let Some(value) = latest {
            persist(store, &value);
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn persist<S: QueryStore + ?Sized>(store: &S, value: &str) {
    match store.save(value) {
        Ok(()) => debug!(
            "event=query_save module=service status=ok query_len={}",
            value.chars().count()
        ),
        Err(err) => warn!(
            "event=query_save module=service status=error error_code=store_write_failed error={err}"
        ),
    }
}
