//! Fixed-size extraction worker pool
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │  ExtractionCoordinator   │
//!              │  - enqueue batch, close  │
//!              │  - join all workers      │
//!              └────────────┬─────────────┘
//!                           │
//!              ┌────────────▼─────────────┐
//!              │        WorkQueue         │
//!              │ (crossbeam, batch-sized) │
//!              └────────────┬─────────────┘
//!       ┌───────────────────┼───────────────────┐
//! ┌─────▼─────┐       ┌─────▼─────┐       ┌─────▼─────┐
//! │  Worker 1 │       │  Worker 2 │  ...  │  Worker N │
//! │  tar.gz → │       │  tar.gz → │       │  tar.gz → │
//! │  staging  │       │  staging  │       │  staging  │
//! └───────────┘       └───────────┘       └───────────┘
//! ```

pub mod coordinator;
pub mod queue;
pub mod worker;

pub use coordinator::{ExtractionCoordinator, ExtractionResult};
pub use queue::{WorkQueue, WorkQueueReceiver};
pub use worker::{ArchiveObserver, PoolTotals, Worker, WorkerStats};
