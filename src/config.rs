//! Configuration types for bundle-stager
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The mutually exclusive archive input specification

use crate::error::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default number of extraction workers
pub const DEFAULT_WORKERS: usize = 4;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 256;

/// Suffix of archives picked up in directory mode
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Suffix of archive entries that are staged
pub const ENTRY_SUFFIX: &str = ".json";

/// Prefix of AppleDouble resource-fork shadow files
pub const SHADOW_PREFIX: &str = "._";

/// Root of everything the tool writes besides the run log
pub const RESOURCES_ROOT: &str = "./.resources";

/// Working directory of the downstream ELK stack
pub const RESOURCES_DIR: &str = "./.resources/elk";

/// Default staging directory, read by the ELK pipeline
pub const DEFAULT_OUTPUT_DIR: &str = "./.resources/elk/json_logs";

/// Default run log file
pub const DEFAULT_LOG_FILE: &str = "load_ishinobu.log";

/// Load JSON logs collected in tar.gz bundles into an ELK stack
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bundle-stager",
    version,
    about = "Load JSON logs collected in tar.gz bundles into the ELK stack",
    long_about = "Extracts the JSON log records contained in tar.gz collection bundles into a flat \
                  staging directory using a pool of worker threads, then starts the ELK stack \
                  that ingests them.",
    after_help = "EXAMPLES:\n    \
        bundle-stager load --dir ./collections\n    \
        bundle-stager load --file host1.tar.gz -w 8\n    \
        bundle-stager load --dir ./collections --no-stack -q\n    \
        bundle-stager down\n    \
        bundle-stager clean --log-file run.log"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract archives into the staging directory and start the ELK stack
    Load(LoadArgs),

    /// Stop the ELK stack
    Down,

    /// Stop the ELK stack, remove its data volume and delete staged files and the run log
    Clean(CleanArgs),
}

/// Arguments of the `load` subcommand
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Directory where compressed JSON logs (tar.gz) are stored
    #[arg(long, value_name = "DIR", default_value = "")]
    pub dir: String,

    /// Single tar.gz where compressed JSON logs are stored
    #[arg(long, value_name = "FILE", default_value = "")]
    pub file: String,

    /// Number of extraction workers
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Staging directory for extracted JSON files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Run log file (appended to, never truncated)
    #[arg(long, default_value = DEFAULT_LOG_FILE, value_name = "FILE")]
    pub log_file: PathBuf,

    /// Only extract; do not provision assets or start the stack
    #[arg(long)]
    pub no_stack: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-entry log lines)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Arguments of the `clean` subcommand
///
/// Only the resources directory and the named log are deleted. A staging
/// directory chosen with `load -o` outside the resources directory is kept.
#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Run log file to delete (the value given to `load --log-file`)
    #[arg(long, default_value = DEFAULT_LOG_FILE, value_name = "FILE")]
    pub log_file: PathBuf,
}

/// Where the archives of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    /// Every `*.tar.gz` directly inside this directory
    Directory(PathBuf),

    /// Exactly this archive, existence checked at processing time
    File(PathBuf),
}

impl InputSpec {
    /// Build from the two raw CLI values; an empty string means "not given"
    pub fn from_parts(dir: &str, file: &str) -> Result<Self, ConfigError> {
        match (dir.is_empty(), file.is_empty()) {
            (false, true) => Ok(InputSpec::Directory(PathBuf::from(dir))),
            (true, false) => Ok(InputSpec::File(PathBuf::from(file))),
            _ => Err(ConfigError::InvalidInput),
        }
    }
}

/// Validated runtime configuration for `load`
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Archive input
    pub input: InputSpec,

    /// Staging directory
    pub output_dir: PathBuf,

    /// Run log path
    pub log_file: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Provision assets and start the stack after extraction
    pub start_stack: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl LoadConfig {
    /// Create and validate configuration from CLI arguments
    ///
    /// Performs no filesystem access.
    pub fn from_args(args: LoadArgs) -> Result<Self, ConfigError> {
        let input = InputSpec::from_parts(&args.dir, &args.file)?;

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        Ok(Self {
            input,
            output_dir: args.output_dir,
            log_file: args.log_file,
            worker_count: args.workers,
            start_stack: !args.no_stack,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_args(dir: &str, file: &str) -> LoadArgs {
        LoadArgs {
            dir: dir.into(),
            file: file.into(),
            workers: DEFAULT_WORKERS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            no_stack: false,
            quiet: false,
            verbose: false,
        }
    }

    #[test]
    fn test_input_spec_directory() {
        let spec = InputSpec::from_parts("/data", "").unwrap();
        assert_eq!(spec, InputSpec::Directory(PathBuf::from("/data")));
    }

    #[test]
    fn test_input_spec_file() {
        let spec = InputSpec::from_parts("", "host.tar.gz").unwrap();
        assert_eq!(spec, InputSpec::File(PathBuf::from("host.tar.gz")));
    }

    #[test]
    fn test_input_spec_ambiguous() {
        assert_eq!(InputSpec::from_parts("", ""), Err(ConfigError::InvalidInput));
        assert_eq!(
            InputSpec::from_parts("/data", "host.tar.gz"),
            Err(ConfigError::InvalidInput)
        );
    }

    #[test]
    fn test_worker_count_validation() {
        let mut args = load_args("/data", "");
        args.workers = 0;
        assert!(matches!(
            LoadConfig::from_args(args),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));

        let mut args = load_args("/data", "");
        args.workers = MAX_WORKERS + 1;
        assert!(LoadConfig::from_args(args).is_err());
    }

    #[test]
    fn test_parse_load_command() {
        let args = CliArgs::try_parse_from([
            "bundle-stager",
            "load",
            "--dir",
            "/data",
            "-w",
            "8",
            "--no-stack",
            "-q",
        ])
        .unwrap();

        let Command::Load(load) = args.command else {
            panic!("expected load subcommand");
        };
        let config = LoadConfig::from_args(load).unwrap();
        assert_eq!(config.input, InputSpec::Directory(PathBuf::from("/data")));
        assert_eq!(config.worker_count, 8);
        assert!(!config.start_stack);
        assert!(!config.show_progress);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_parse_down_and_clean() {
        let args = CliArgs::try_parse_from(["bundle-stager", "down"]).unwrap();
        assert!(matches!(args.command, Command::Down));

        let args = CliArgs::try_parse_from(["bundle-stager", "clean"]).unwrap();
        let Command::Clean(clean) = args.command else {
            panic!("expected clean subcommand");
        };
        assert_eq!(clean.log_file, PathBuf::from(DEFAULT_LOG_FILE));

        let args =
            CliArgs::try_parse_from(["bundle-stager", "clean", "--log-file", "run.log"]).unwrap();
        let Command::Clean(clean) = args.command else {
            panic!("expected clean subcommand");
        };
        assert_eq!(clean.log_file, PathBuf::from("run.log"));
    }
}
