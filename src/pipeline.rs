//! End-to-end staging run
//!
//! Fixes the order of a run: the staging directory is created and the
//! archive list resolved before any worker exists, so every fatal error
//! surfaces while nothing is running yet.

use crate::archive::{ArchiveProcessor, StagingSink};
use crate::config::InputSpec;
use crate::error::Result;
use crate::pool::{ArchiveObserver, ExtractionCoordinator, ExtractionResult};
use crate::source::{self, ArchiveLocation};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A prepared run: staging directory exists, archives are known
pub struct StagingPipeline {
    sink: StagingSink,
    archives: Vec<ArchiveLocation>,
    coordinator: ExtractionCoordinator,
}

impl StagingPipeline {
    /// Create the staging directory and resolve the archive list
    pub fn prepare(input: &InputSpec, staging_dir: &Path, worker_count: usize) -> Result<Self> {
        let sink = StagingSink::create(staging_dir)?;
        let archives = source::resolve(input)?;
        let processor = Arc::new(ArchiveProcessor::new(sink.clone()));
        let coordinator = ExtractionCoordinator::new(processor, worker_count);

        Ok(Self {
            sink,
            archives,
            coordinator,
        })
    }

    /// Archives that will be processed
    pub fn archives(&self) -> &[ArchiveLocation] {
        &self.archives
    }

    /// Staging directory
    pub fn staging_dir(&self) -> &Path {
        self.sink.dir()
    }

    /// Shutdown flag of the underlying coordinator
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.coordinator.shutdown_flag()
    }

    /// Call `observer` after every archive
    pub fn with_observer(mut self, observer: ArchiveObserver) -> Self {
        self.coordinator = self.coordinator.with_observer(observer);
        self
    }

    /// Run the pool over all archives and wait for it
    pub fn run(self) -> Result<ExtractionResult> {
        self.coordinator.run(self.archives)
    }
}

/// Stage every archive named by `input` into `staging_dir`
pub fn stage_archives(
    input: &InputSpec,
    staging_dir: &Path,
    worker_count: usize,
) -> Result<ExtractionResult> {
    StagingPipeline::prepare(input, staging_dir, worker_count)?.run()
}
