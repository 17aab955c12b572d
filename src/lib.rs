//! bundle-stager - Concurrent extraction of JSON logs from tar.gz bundles
//!
//! Takes a directory of compressed log collections (or a single one), pulls
//! the JSON log records out of every archive and drops them into one flat
//! staging directory, where an ELK stack picks them up.
//!
//! # Features
//!
//! - **Parallel Extraction**: A fixed pool of worker threads, one archive per
//!   worker at a time, fed from a closable queue.
//!
//! - **Streaming**: gzip and tar are decoded on the fly; entries are copied
//!   straight from the decoder into the staging directory.
//!
//! - **Failure Isolation**: A broken archive or entry is logged and skipped.
//!   Only configuration and environment errors end a run.
//!
//! # Architecture
//!
//! ```text
//!   --dir / --file
//!         │
//!         ▼
//! ┌─────────────────┐      ┌─────────────────────────────────────────┐
//! │  source::resolve│─────►│           ExtractionCoordinator          │
//! │  *.tar.gz list  │      │  queue ─► Worker 1 .. Worker N ─► join   │
//! └─────────────────┘      └────────────────────┬────────────────────┘
//!                                               │ per archive
//!                                               ▼
//!                          ┌─────────────────────────────────────────┐
//!                          │            ArchiveProcessor              │
//!                          │  gzip ─► tar ─► filter ─► StagingSink    │
//!                          └────────────────────┬────────────────────┘
//!                                               ▼
//!                                  .resources/elk/json_logs/*.json
//! ```
//!
//! # Example
//!
//! ```bash
//! # Stage a folder of collections and start ELK
//! bundle-stager load --dir ./collections
//!
//! # Only extract one bundle, eight workers
//! bundle-stager load --file host1.tar.gz -w 8 --no-stack
//!
//! # Tear everything down
//! bundle-stager clean
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod runlog;
pub mod source;
pub mod stack;

pub use config::{CliArgs, InputSpec, LoadConfig};
pub use error::{Result, StagerError};
pub use pipeline::{stage_archives, StagingPipeline};
pub use pool::{ExtractionCoordinator, ExtractionResult};
pub use source::ArchiveLocation;
