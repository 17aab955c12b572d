//! Extraction coordinator - runs a batch of archives through the worker pool
//!
//! The coordinator is responsible for:
//! - Sizing the work queue to the batch
//! - Spawning every worker before the first item is enqueued
//! - Enqueueing the batch and closing the queue
//! - Joining all workers, so it only returns once the last in-flight
//!   archive has finished
//! - Final statistics

use crate::archive::ArchiveHandler;
use crate::error::Result;
use crate::pool::queue::WorkQueue;
use crate::pool::worker::{aggregate_stats, ArchiveObserver, PoolTotals, Worker, WorkerStats};
use crate::source::ArchiveLocation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed extraction run
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Archives in the batch
    pub archives_total: u64,

    /// Archives pushed onto the work queue
    pub archives_queued: u64,

    /// Archives taken off the work queue by a worker
    pub archives_dequeued: u64,

    /// Totals over all workers
    pub totals: PoolTotals,

    /// Time taken for the run
    pub duration: Duration,

    /// Whether every archive was attempted (false only after a shutdown request)
    pub completed: bool,
}

impl ExtractionResult {
    /// Archives never handed to a worker because of a shutdown request
    pub fn archives_not_attempted(&self) -> u64 {
        self.archives_total - self.totals.archives_attempted
    }
}

/// Coordinates the parallel extraction of a batch of archives
pub struct ExtractionCoordinator {
    /// Per-archive processing
    handler: Arc<dyn ArchiveHandler>,

    /// Number of workers
    worker_count: usize,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,

    /// Optional per-archive callback (progress display)
    observer: Option<ArchiveObserver>,
}

impl ExtractionCoordinator {
    /// Create a new coordinator
    pub fn new(handler: Arc<dyn ArchiveHandler>, worker_count: usize) -> Self {
        Self {
            handler,
            worker_count: worker_count.max(1),
            shutdown: Arc::new(AtomicBool::new(false)),
            observer: None,
        }
    }

    /// Call `observer` after every archive
    pub fn with_observer(mut self, observer: ArchiveObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    ///
    /// Once set, workers finish the archive they hold and take no new ones.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Process every archive of the batch and wait for all workers
    pub fn run(self, archives: Vec<ArchiveLocation>) -> Result<ExtractionResult> {
        let start_time = Instant::now();
        let archives_total = archives.len() as u64;

        if archives.is_empty() {
            info!("Nothing to extract");
            return Ok(ExtractionResult {
                archives_total,
                archives_queued: 0,
                archives_dequeued: 0,
                totals: PoolTotals::default(),
                duration: start_time.elapsed(),
                completed: true,
            });
        }

        info!(
            archives = archives_total,
            workers = self.worker_count,
            "Starting extraction"
        );

        let mut queue = WorkQueue::new(archives.len());

        // Workers first, then items
        let workers = self.spawn_workers(&mut queue)?;
        let stats: Vec<Arc<WorkerStats>> = workers.iter().map(Worker::stats_handle).collect();

        for location in archives {
            info!(archive = %location, "Queued archive");
            queue.push(location)?;
        }
        queue.close();

        self.join_workers(workers);

        let queue_stats = queue.stats();
        debug!(
            enqueued = queue_stats.enqueued(),
            dequeued = queue_stats.dequeued(),
            "Work queue drained"
        );

        let totals = aggregate_stats(&stats);
        let duration = start_time.elapsed();
        let completed =
            !self.shutdown.load(Ordering::SeqCst) || totals.archives_attempted == archives_total;

        info!(
            attempted = totals.archives_attempted,
            processed = totals.archives_processed,
            failed = totals.archives_failed,
            entries = totals.entries_written,
            bytes = totals.bytes_written,
            duration_ms = duration.as_millis() as u64,
            "Extraction completed"
        );

        Ok(ExtractionResult {
            archives_total,
            archives_queued: queue_stats.enqueued(),
            archives_dequeued: queue_stats.dequeued(),
            totals,
            duration,
            completed,
        })
    }

    /// Spawn worker threads
    ///
    /// If a spawn fails, the queue is closed and the workers already running
    /// are joined before the error is returned.
    fn spawn_workers(&self, queue: &mut WorkQueue) -> Result<Vec<Worker>> {
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let mut workers = Vec::with_capacity(self.worker_count);

        for id in 0..self.worker_count {
            let spawned = Worker::spawn(
                id,
                Arc::clone(&self.handler),
                queue.receiver(),
                Arc::clone(&self.shutdown),
                self.observer.clone(),
                dispatch.clone(),
            );

            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    queue.close();
                    self.join_workers(workers);
                    return Err(e.into());
                }
            }
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(workers)
    }

    /// Join all worker threads
    fn join_workers(&self, workers: Vec<Worker>) {
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
            }
        }
    }
}
