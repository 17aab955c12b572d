//! Archive processing
//!
//! - `processor` - streams one tar.gz through decompression and unpacking
//! - `filter` - decides which entries are staged and under which name
//! - `sink` - the flat staging directory

pub mod filter;
pub mod processor;
pub mod sink;

pub use filter::{classify, EntryDecision};
pub use processor::{ArchiveHandler, ArchiveProcessor, ArchiveReport, Compression};
pub use sink::StagingSink;
