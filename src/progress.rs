//! Progress reporting for the extraction run
//!
//! Provides a live archive counter using indicatif and a styled summary.

use crate::error::ArchiveOutcome;
use crate::pool::ExtractionResult;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Progress reporter that displays extraction status
#[derive(Clone)]
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,

    /// Archives that ended with an archive-level error
    failed: Arc<AtomicU64>,

    /// Entries staged so far
    entries: Arc<AtomicU64>,
}

impl ProgressReporter {
    /// Create a new progress reporter for `total` archives
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} archives | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            failed: Arc::new(AtomicU64::new(0)),
            entries: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record one finished archive
    pub fn record(&self, outcome: &ArchiveOutcome) {
        match outcome {
            ArchiveOutcome::Processed { written, .. } => {
                self.entries.fetch_add(*written, Ordering::Relaxed);
            }
            ArchiveOutcome::Failed { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.bar.set_message(format!(
            "Entries: {} | Failed archives: {}",
            format_number(self.entries.load(Ordering::Relaxed)),
            self.failed.load(Ordering::Relaxed)
        ));
        self.bar.inc(1);
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the extraction run
pub fn print_summary(result: &ExtractionResult, staging_dir: &Path) {
    let totals = &result.totals;
    let duration_secs = result.duration.as_secs_f64();

    println!();
    if result.completed {
        println!("{}", style("Extraction Complete").green().bold());
    } else {
        println!("{}", style("Extraction Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} attempted, {} processed",
        style("Archives:").bold(),
        format_number(totals.archives_attempted),
        format_number(totals.archives_processed)
    );
    if totals.archives_failed > 0 {
        println!(
            "  {} {}",
            style("Failed archives:").yellow().bold(),
            format_number(totals.archives_failed)
        );
    }
    if !result.completed {
        println!(
            "  {} {}",
            style("Not attempted:").yellow().bold(),
            format_number(result.archives_not_attempted())
        );
    }
    println!(
        "  {} {} staged, {} skipped",
        style("Entries:").bold(),
        format_number(totals.entries_written),
        format_number(totals.entries_skipped)
    );
    if totals.entries_failed > 0 {
        println!(
            "  {} {}",
            style("Failed entries:").yellow().bold(),
            format_number(totals.entries_failed)
        );
    }
    println!(
        "  {} {}",
        style("Staged size:").bold(),
        format_size(totals.bytes_written, BINARY)
    );
    println!("  {} {:.1}s", style("Duration:").bold(), duration_secs);
    println!("  {} {}", style("Staging:").bold(), staging_dir.display());
    println!();
}

/// Print a header at the start of the run
pub fn print_header(source: &str, workers: usize, staging_dir: &Path) {
    println!();
    println!(
        "{} {}",
        style("bundle-stager").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Staging:").bold(), staging_dir.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use std::path::PathBuf;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_record_counts_outcomes() {
        let reporter = ProgressReporter::new(2);
        reporter.record(&ArchiveOutcome::Processed {
            path: PathBuf::from("a.tar.gz"),
            written: 5,
            skipped: 1,
            failed: 0,
        });
        reporter.record(&ArchiveOutcome::Failed {
            error: ArchiveError::Decompression {
                path: PathBuf::from("b.tar.gz"),
                reason: "not a gzip stream".into(),
            },
        });
        reporter.finish_and_clear();

        assert_eq!(reporter.entries.load(Ordering::Relaxed), 5);
        assert_eq!(reporter.failed.load(Ordering::Relaxed), 1);
    }
}
