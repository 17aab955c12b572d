//! Archive discovery
//!
//! Resolves the validated [`InputSpec`] into the ordered list of archives a
//! run will process. Directory mode lists `*.tar.gz` entries directly inside
//! the directory (no recursion) in byte-wise name order; file mode yields the
//! given path untouched, leaving existence checks to the processor so a
//! missing file is reported like any other unopenable archive.

use crate::config::{InputSpec, ARCHIVE_SUFFIX};
use crate::error::{Result, StagerError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to one archive scheduled for processing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveLocation(PathBuf);

impl ArchiveLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArchiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Resolve the input specification into archive locations
pub fn resolve(input: &InputSpec) -> Result<Vec<ArchiveLocation>> {
    match input {
        InputSpec::File(path) => Ok(vec![ArchiveLocation::new(path.clone())]),
        InputSpec::Directory(dir) => {
            let archives = discover_archives(dir)?;
            if archives.is_empty() {
                info!(dir = %dir.display(), "No tar.gz files found to process.");
            } else {
                info!(count = archives.len(), "Found archive(s) to process.");
            }
            Ok(archives)
        }
    }
}

/// List the archives directly inside `dir`
fn discover_archives(dir: &Path) -> Result<Vec<ArchiveLocation>> {
    let read_dir = fs::read_dir(dir).map_err(|source| StagerError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| StagerError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;

        let name = entry.file_name();
        if !is_archive_name(&name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            debug!(path = %path.display(), "Skipping directory with archive suffix");
            continue;
        }

        archives.push(ArchiveLocation::new(path));
    }

    archives.sort();
    Ok(archives)
}

/// Whether a file name follows the tar.gz naming convention
pub fn is_archive_name(name: &str) -> bool {
    name.len() > ARCHIVE_SUFFIX.len() && name.ends_with(ARCHIVE_SUFFIX)
}
