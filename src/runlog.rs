//! Run log
//!
//! Every event is written twice: to the console and appended to a log file
//! that survives the run. Both are `tracing-subscriber` fmt layers under one
//! filter. Each event is formatted into a single line before it reaches a
//! writer, and the file writer sits behind a mutex, so lines from concurrent
//! workers never interleave.

use crate::error::{Result, StagerError};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Handle to the installed run log
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Open (append) the log file and install the global subscriber
    pub fn init(path: &Path, verbose: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StagerError::Io)?;

        build_subscriber(verbose, io::stdout, Mutex::new(file))
            .try_init()
            .map_err(|e| StagerError::Io(io::Error::other(e)))?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Log filter for the crate
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("bundle_stager=debug,warn")
    } else {
        EnvFilter::new("bundle_stager=info,warn")
    }
}

/// Subscriber writing every event to both `console` and `file`
///
/// `init` uses stdout and the log file; tests pass in-memory writers.
pub fn build_subscriber<C, F>(verbose: bool, console: C, file: F) -> impl Subscriber + Send + Sync
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(console);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(file);

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(console_layer)
        .with(file_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tracing::{debug, info};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_events_reach_both_writers() {
        let console = Buffer::default();
        let file = Buffer::default();
        let (c, f) = (console.clone(), file.clone());
        let subscriber = build_subscriber(false, move || c.clone(), move || f.clone());

        tracing::subscriber::with_default(subscriber, || {
            info!(archive = "a.tar.gz", "Processing archive");
            debug!("hidden at info level");
        });

        let file_text = file.contents();
        assert_eq!(file_text.lines().count(), 1);
        assert!(file_text.contains("Processing archive"));
        assert!(file_text.contains("a.tar.gz"));
        assert!(file_text.ends_with('\n'));
        assert!(!file_text.contains("hidden"));
        assert!(console.contents().contains("Processing archive"));
    }

    #[test]
    fn test_verbose_includes_debug() {
        let file = Buffer::default();
        let f = file.clone();
        let subscriber = build_subscriber(true, io::sink, move || f.clone());

        tracing::subscriber::with_default(subscriber, || {
            debug!("entry staged");
        });

        assert!(file.contents().contains("entry staged"));
    }
}
