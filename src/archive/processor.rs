//! Per-archive extraction
//!
//! One archive is streamed end to end on the calling thread:
//!
//! ```text
//! File ─► BufReader ─► MultiGzDecoder ─► tar::Archive ─► entries ─► filter ─► StagingSink
//! ```
//!
//! Nothing is buffered beyond the reader buffers. The entry sequence is
//! forward-only; a second pass means reopening the file.

use crate::archive::filter::{classify, EntryDecision};
use crate::archive::sink::StagingSink;
use crate::error::ArchiveError;
use crate::source::ArchiveLocation;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Read buffer for the compressed stream
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compression layer identified from the leading bytes of an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
    Zstd,
    Bzip2,
    Unknown,
}

impl Compression {
    /// Identify the compression scheme from magic bytes
    pub fn detect(data: &[u8]) -> Self {
        match data {
            [0x1F, 0x8B, ..] => Compression::Gzip,
            [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Compression::Xz,
            [0x28, 0xB5, 0x2F, 0xFD, ..] => Compression::Zstd,
            [0x42, 0x5A, 0x68, ..] => Compression::Bzip2,
            _ => Compression::Unknown,
        }
    }
}

/// Counters for one processed archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Entries staged
    pub written: u64,

    /// Entries filtered out
    pub skipped: u64,

    /// Accepted entries whose staging failed
    pub failed: u64,

    /// Bytes staged
    pub bytes: u64,
}

/// Something that processes one archive end to end
///
/// The pool is generic over this so it can run without touching archives.
pub trait ArchiveHandler: Send + Sync {
    fn process(&self, location: &ArchiveLocation) -> Result<ArchiveReport, ArchiveError>;
}

/// Extracts `.json` entries of tar.gz archives into a staging directory
#[derive(Debug, Clone)]
pub struct ArchiveProcessor {
    sink: StagingSink,
}

impl ArchiveProcessor {
    pub fn new(sink: StagingSink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &StagingSink {
        &self.sink
    }

    /// Open the archive and wrap it in the matching decompression layer
    fn open_decoder(path: &Path) -> Result<MultiGzDecoder<BufReader<File>>, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let head = reader.fill_buf().map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let reason = match Compression::detect(head) {
            Compression::Gzip => None,
            Compression::Unknown if head.is_empty() => Some("archive is empty".to_string()),
            Compression::Unknown => Some("not a gzip stream".to_string()),
            other => Some(format!("unsupported compression {:?}", other)),
        };
        if let Some(reason) = reason {
            return Err(ArchiveError::Decompression {
                path: path.to_path_buf(),
                reason,
            });
        }

        let decoder = MultiGzDecoder::new(reader);
        if decoder.header().is_none() {
            return Err(ArchiveError::Decompression {
                path: path.to_path_buf(),
                reason: "invalid gzip header".into(),
            });
        }

        Ok(decoder)
    }

    /// Stage every accepted entry of `archive`
    fn extract_entries<R: Read>(
        &self,
        path: &Path,
        archive: &mut tar::Archive<R>,
    ) -> Result<ArchiveReport, ArchiveError> {
        let container_error = |source| ArchiveError::Container {
            path: path.to_path_buf(),
            source,
        };

        let mut report = ArchiveReport::default();

        for entry in archive.entries().map_err(container_error)? {
            let mut entry = entry.map_err(container_error)?;

            let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let is_regular = entry.header().entry_type().is_file();

            let name = match classify(&raw_name, is_regular) {
                EntryDecision::Accept(name) => name,
                decision => {
                    debug!(archive = %path.display(), entry = %raw_name, ?decision, "Entry skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            match self.sink.write_entry(&name, &mut entry) {
                Ok(bytes) => {
                    debug!(archive = %path.display(), entry = %raw_name, bytes, "Entry staged");
                    report.written += 1;
                    report.bytes += bytes;
                }
                Err(e) => {
                    warn!(archive = %path.display(), entry = %raw_name, error = %e, "Entry failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

impl ArchiveHandler for ArchiveProcessor {
    fn process(&self, location: &ArchiveLocation) -> Result<ArchiveReport, ArchiveError> {
        let path = location.path();
        let decoder = Self::open_decoder(path)?;
        let mut archive = tar::Archive::new(decoder);
        self.extract_entries(path, &mut archive)
    }
}
