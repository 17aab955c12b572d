//! Worker thread logic for parallel archive extraction
//!
//! Each worker:
//! - Pulls archives from the shared work queue until it is closed and drained
//! - Runs the archive handler synchronously, one archive at a time
//! - Turns every failure of that archive, panics included, into a logged
//!   outcome and moves on to the next item

use crate::archive::{ArchiveHandler, ArchiveReport};
use crate::error::{ArchiveError, ArchiveOutcome, WorkerError};
use crate::pool::queue::WorkQueueReceiver;
use crate::source::ArchiveLocation;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Callback invoked after each archive, from the worker thread
pub type ArchiveObserver = Arc<dyn Fn(&ArchiveOutcome) + Send + Sync>;

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Archives taken from the queue
    pub archives_attempted: AtomicU64,

    /// Archives processed to the end of their entry sequence
    pub archives_processed: AtomicU64,

    /// Archives abandoned with an archive-level error
    pub archives_failed: AtomicU64,

    /// Entries staged
    pub entries_written: AtomicU64,

    /// Entries filtered out
    pub entries_skipped: AtomicU64,

    /// Entries whose staging failed
    pub entries_failed: AtomicU64,

    /// Bytes staged
    pub bytes_written: AtomicU64,
}

impl WorkerStats {
    fn record_attempt(&self) {
        self.archives_attempted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_processed(&self, report: &ArchiveReport) {
        self.archives_processed.fetch_add(1, Ordering::Relaxed);
        self.entries_written.fetch_add(report.written, Ordering::Relaxed);
        self.entries_skipped.fetch_add(report.skipped, Ordering::Relaxed);
        self.entries_failed.fetch_add(report.failed, Ordering::Relaxed);
        self.bytes_written.fetch_add(report.bytes, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.archives_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals summed over all workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    pub archives_attempted: u64,
    pub archives_processed: u64,
    pub archives_failed: u64,
    pub entries_written: u64,
    pub entries_skipped: u64,
    pub entries_failed: u64,
    pub bytes_written: u64,
}

/// A worker thread that processes archives
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    ///
    /// The thread logs through `dispatch`, so workers write to whatever
    /// subscriber the spawning thread was using.
    pub fn spawn(
        id: usize,
        handler: Arc<dyn ArchiveHandler>,
        queue_rx: WorkQueueReceiver,
        shutdown: Arc<AtomicBool>,
        observer: Option<ArchiveObserver>,
        dispatch: tracing::Dispatch,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("extractor-{}", id))
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    worker_loop(id, handler, queue_rx, shutdown, observer, stats_clone)
                })
            })
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Shared handle to the statistics, readable after `join`
    pub fn stats_handle(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|payload| WorkerError::Panicked {
                id: self.id,
                message: panic_message(payload.as_ref()),
            })
        } else {
            Ok(())
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    handler: Arc<dyn ArchiveHandler>,
    queue_rx: WorkQueueReceiver,
    shutdown: Arc<AtomicBool>,
    observer: Option<ArchiveObserver>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker = id, "Worker starting");

    while !shutdown.load(Ordering::Relaxed) {
        let Some(location) = queue_rx.recv() else {
            break;
        };

        info!(worker = id, archive = %location, "Processing archive");

        let outcome = process_archive(handler.as_ref(), &location, &stats);

        match &outcome {
            ArchiveOutcome::Processed {
                written,
                skipped,
                failed,
                ..
            } => {
                info!(
                    worker = id,
                    archive = %location,
                    written,
                    skipped,
                    failed,
                    "Successfully processed archive"
                );
            }
            ArchiveOutcome::Failed { error } => {
                error!(worker = id, archive = %location, error = %error, "Error processing archive");
            }
        }

        if let Some(observer) = &observer {
            observer(&outcome);
        }
    }

    debug!(
        worker = id,
        archives = stats.archives_attempted.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Process a single archive, containing any panic to this archive
fn process_archive(
    handler: &dyn ArchiveHandler,
    location: &ArchiveLocation,
    stats: &WorkerStats,
) -> ArchiveOutcome {
    stats.record_attempt();

    let result = panic::catch_unwind(AssertUnwindSafe(|| handler.process(location)))
        .unwrap_or_else(|payload| {
            Err(ArchiveError::Panicked {
                path: location.path().to_path_buf(),
                message: panic_message(payload.as_ref()),
            })
        });

    match result {
        Ok(report) => {
            stats.record_processed(&report);
            ArchiveOutcome::Processed {
                path: location.path().to_path_buf(),
                written: report.written,
                skipped: report.skipped,
                failed: report.failed,
            }
        }
        Err(error) => {
            stats.record_failed();
            ArchiveOutcome::Failed { error }
        }
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(stats: &[Arc<WorkerStats>]) -> PoolTotals {
    let mut totals = PoolTotals::default();

    for s in stats {
        totals.archives_attempted += s.archives_attempted.load(Ordering::Relaxed);
        totals.archives_processed += s.archives_processed.load(Ordering::Relaxed);
        totals.archives_failed += s.archives_failed.load(Ordering::Relaxed);
        totals.entries_written += s.entries_written.load(Ordering::Relaxed);
        totals.entries_skipped += s.entries_skipped.load(Ordering::Relaxed);
        totals.entries_failed += s.entries_failed.load(Ordering::Relaxed);
        totals.bytes_written += s.bytes_written.load(Ordering::Relaxed);
    }

    totals
}
