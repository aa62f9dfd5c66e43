//! Named background tasks with joinable result channels.
//!
//! Workers run on plain OS threads and hand their outcome back over an
//! mpsc channel, so a caller can poll, join, or walk away; a `Result`
//! payload carries errors instead of losing them in a detached thread.

use crate::adapters::sqlite_snapshot_store::SqliteSnapshotStore;
use crate::domain::error::EquiscoreError;
use crate::domain::timeframe::Timeframe;
use crate::engine::analyzer::Analyzer;
use crate::engine::progress::ProgressTracker;
use crate::ports::provider_port::MarketDataPort;
use chrono::Local;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use tracing::info;

pub struct TaskHandle<R> {
    name: String,
    thread: JoinHandle<()>,
    rx: Receiver<R>,
}

/// Run `f` on a named thread. The handle owns the only receiver for the
/// task's result.
pub fn spawn_task<R, F>(name: &str, f: F) -> Result<TaskHandle<R>, EquiscoreError>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx): (Sender<R>, Receiver<R>) = mpsc::channel();
    let thread = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            // The receiver may be gone; the task ran either way
            let _ = tx.send(f());
        })?;

    Ok(TaskHandle {
        name: name.to_owned(),
        thread,
        rx,
    })
}

impl<R> TaskHandle<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Non-blocking poll; `None` while the task is still running.
    pub fn try_result(&self) -> Option<R> {
        self.rx.try_recv().ok()
    }

    /// Block until the task is done. `None` only if the task panicked
    /// before sending its result.
    pub fn join(self) -> Option<R> {
        let result = self.rx.recv().ok();
        let _ = self.thread.join();
        result
    }
}

/// Warm every timeframe's scan slots in the background. Yields the
/// number of stocks scored per timeframe.
pub fn spawn_prefetch<P>(
    analyzer: Arc<Analyzer<P>>,
) -> Result<TaskHandle<Vec<(Timeframe, usize)>>, EquiscoreError>
where
    P: MarketDataPort + Send + Sync + 'static,
{
    spawn_task("prefetch", move || {
        let progress = ProgressTracker::new();
        Timeframe::ALL
            .iter()
            .map(|&timeframe| {
                let scored = analyzer.scan(timeframe, &progress).len();
                info!(%timeframe, scored, "prefetch pass done");
                (timeframe, scored)
            })
            .collect()
    })
}

/// Scan one timeframe and record today's snapshot for return tracking.
/// Yields the number of stocks recorded.
pub fn spawn_snapshot<P>(
    analyzer: Arc<Analyzer<P>>,
    snapshots: Arc<SqliteSnapshotStore>,
    timeframe: Timeframe,
) -> Result<TaskHandle<Result<usize, EquiscoreError>>, EquiscoreError>
where
    P: MarketDataPort + Send + Sync + 'static,
{
    spawn_task("daily-snapshot", move || {
        let progress = ProgressTracker::new();
        let stocks = analyzer.scan(timeframe, &progress);
        let today = Local::now().date_naive();
        snapshots.record_snapshot(&stocks, timeframe.as_str(), today)?;
        info!(%timeframe, recorded = stocks.len(), "snapshot recorded");
        Ok(stocks.len())
    })
}
