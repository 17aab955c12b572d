//! Error types for bundle-stager
//!
//! The hierarchy follows the three failure tiers of a run:
//! - Fatal errors (`StagerError`, `ConfigError`) stop the run before any
//!   worker is spawned
//! - Archive-level errors (`ArchiveError`) abandon one archive; the batch
//!   continues
//! - Entry-level errors (`EntryError`) abandon one entry; the archive
//!   continues
//!
//! Only the fatal tier ever reaches `main`. The other two are logged where
//! they happen and counted in the run statistics.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a bundle-stager run
#[derive(Error, Debug)]
pub enum StagerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The staging directory could not be created
    #[error("Failed to create staging directory '{path}': {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input directory could not be enumerated
    #[error("Failed to read archive directory '{path}': {source}")]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Downstream stack errors
    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    /// I/O errors (run log, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither or both of --dir and --file were given
    #[error("You must specify exactly one of --dir or --file")]
    InvalidInput,

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },
}

/// Failure that abandons a single archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive could not be opened for reading
    #[error("failed to open archive '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The compression layer could not be set up
    #[error("failed to decompress archive '{path}': {reason}")]
    Decompression { path: PathBuf, reason: String },

    /// The tar layer could not be read
    #[error("failed to read tar container '{path}': {source}")]
    Container {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Processing panicked; the panic was contained to this archive
    #[error("processing of '{path}' panicked: {message}")]
    Panicked { path: PathBuf, message: String },
}

impl ArchiveError {
    /// Archive this error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            ArchiveError::Open { path, .. }
            | ArchiveError::Decompression { path, .. }
            | ArchiveError::Container { path, .. }
            | ArchiveError::Panicked { path, .. } => path,
        }
    }
}

/// Failure that abandons a single archive entry
#[derive(Error, Debug)]
pub enum EntryError {
    /// The staging file could not be created
    #[error("Error creating JSON file '{path}': {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying the entry bytes failed partway
    #[error("Error extracting JSON file '{path}': {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be started
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker thread panicked outside of archive processing
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Work queue already closed
    #[error("Failed to send work item: queue closed")]
    QueueSendFailed,
}

/// Errors from the downstream compose stack
#[derive(Error, Debug)]
pub enum StackError {
    /// The command could not be started at all
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("'{command}' exited with {status}")]
    CommandFailed { command: String, status: String },

    /// Bundled assets could not be written
    #[error("Failed to provision asset '{path}': {source}")]
    Assets {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for StagerError
pub type Result<T> = std::result::Result<T, StagerError>;

/// Outcome of handing one archive to a worker
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// Reached the end of the entry sequence
    Processed {
        path: PathBuf,
        written: u64,
        skipped: u64,
        failed: u64,
    },

    /// Abandoned with an archive-level error
    Failed { error: ArchiveError },
}

impl ArchiveOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, ArchiveOutcome::Processed { .. })
    }

    /// Returns the archive associated with this outcome
    pub fn path(&self) -> &PathBuf {
        match self {
            ArchiveOutcome::Processed { path, .. } => path,
            ArchiveOutcome::Failed { error } => error.path(),
        }
    }
}
