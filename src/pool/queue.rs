//! Closable work queue
//!
//! A crossbeam channel sized to the whole work list, so the producer never
//! blocks. Closing drops the only sender; receivers then drain what is left
//! and get `None`, which is the sole signal for workers to exit.

use crate::error::WorkerError;
use crate::source::ArchiveLocation;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Queue of archives waiting for a worker
pub struct WorkQueue {
    /// Sender, dropped on close
    sender: Option<Sender<ArchiveLocation>>,

    /// Receiver template cloned for each worker
    receiver: Receiver<ArchiveLocation>,

    /// Queue statistics
    stats: Arc<QueueStats>,
}

impl WorkQueue {
    /// Create a queue able to hold `capacity` items without blocking
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        Self {
            sender: Some(sender),
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a receiver for this queue (one per worker)
    pub fn receiver(&self) -> WorkQueueReceiver {
        WorkQueueReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Enqueue one archive
    pub fn push(&self, location: ArchiveLocation) -> Result<(), WorkerError> {
        let sender = self.sender.as_ref().ok_or(WorkerError::QueueSendFailed)?;
        sender
            .send(location)
            .map_err(|_| WorkerError::QueueSendFailed)?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close the queue; no further items can be enqueued
    pub fn close(&mut self) {
        self.sender.take();
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Handle for receiving archives from the queue
#[derive(Clone)]
pub struct WorkQueueReceiver {
    receiver: Receiver<ArchiveLocation>,
    stats: Arc<QueueStats>,
}

impl WorkQueueReceiver {
    /// Receive the next archive
    ///
    /// Blocks until an item is available. Returns `None` once the queue is
    /// closed and drained.
    pub fn recv(&self) -> Option<ArchiveLocation> {
        match self.receiver.recv() {
            Ok(location) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(location)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_after_close() {
        let mut queue = WorkQueue::new(2);
        let receiver = queue.receiver();

        queue.push(ArchiveLocation::new("/a.tar.gz")).unwrap();
        queue.push(ArchiveLocation::new("/b.tar.gz")).unwrap();
        queue.close();

        assert_eq!(receiver.recv(), Some(ArchiveLocation::new("/a.tar.gz")));
        assert_eq!(receiver.recv(), Some(ArchiveLocation::new("/b.tar.gz")));
        assert_eq!(receiver.recv(), None);
    }

    #[test]
    fn test_push_after_close_fails() {
        let mut queue = WorkQueue::new(1);
        queue.close();
        assert!(matches!(
            queue.push(ArchiveLocation::new("/a.tar.gz")),
            Err(WorkerError::QueueSendFailed)
        ));
    }

    #[test]
    fn test_queue_stats() {
        let queue = WorkQueue::new(4);
        let receiver = queue.receiver();

        queue.push(ArchiveLocation::new("/a.tar.gz")).unwrap();
        queue.push(ArchiveLocation::new("/b.tar.gz")).unwrap();

        receiver.recv().unwrap();

        let stats = queue.stats();
        assert_eq!(stats.enqueued(), 2);
        assert_eq!(stats.dequeued(), 1);
    }

    #[test]
    fn test_zero_capacity_still_buffers_one_item() {
        let mut queue = WorkQueue::new(0);
        let receiver = queue.receiver();

        // Would block forever on a rendezvous channel
        queue.push(ArchiveLocation::new("/a.tar.gz")).unwrap();
        queue.close();

        assert_eq!(receiver.recv(), Some(ArchiveLocation::new("/a.tar.gz")));
        assert_eq!(receiver.recv(), None);
    }
}
