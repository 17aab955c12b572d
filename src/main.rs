//! bundle-stager - Load JSON logs from tar.gz bundles into ELK
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use bundle_stager::config::{
    CliArgs, Command, InputSpec, LoadArgs, LoadConfig, RESOURCES_DIR, RESOURCES_ROOT,
};
use bundle_stager::progress::{print_header, print_summary, ProgressReporter};
use bundle_stager::runlog::{self, RunLog};
use bundle_stager::stack::ComposeStack;
use bundle_stager::StagingPipeline;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    match args.command {
        Command::Load(load) => run_load(load),
        Command::Down => {
            setup_console_logging();
            ComposeStack::new(RESOURCES_DIR)
                .down()
                .context("Failed to stop the ELK stack")
        }
        Command::Clean(clean) => {
            setup_console_logging();
            ComposeStack::new(RESOURCES_DIR)
                .purge(&[Path::new(RESOURCES_ROOT), clean.log_file.as_path()])
                .context("Failed to clean up")
        }
    }
}

fn run_load(args: LoadArgs) -> Result<()> {
    // Validate before touching the filesystem
    let config = LoadConfig::from_args(args).context("Invalid configuration")?;

    let run_log = RunLog::init(&config.log_file, config.verbose)
        .with_context(|| format!("Failed to open run log {}", config.log_file.display()))?;
    info!(log = %run_log.path().display(), "Run log opened");

    let pipeline = StagingPipeline::prepare(&config.input, &config.output_dir, config.worker_count)
        .context("Failed to prepare extraction")?;

    if config.show_progress {
        print_header(
            &source_label(&config.input),
            config.worker_count,
            pipeline.staging_dir(),
        );
    }

    let progress = config
        .show_progress
        .then(|| ProgressReporter::new(pipeline.archives().len() as u64));

    let pipeline = match &progress {
        Some(p) => {
            let reporter = p.clone();
            pipeline.with_observer(Arc::new(move |outcome| reporter.record(outcome)))
        }
        None => pipeline,
    };

    // Setup signal handler for graceful shutdown
    let shutdown_flag = pipeline.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing archives in progress...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let staging_dir = pipeline.staging_dir().to_path_buf();
    let result = pipeline.run().context("Extraction failed")?;

    if let Some(ref p) = progress {
        if result.completed {
            p.finish("Extraction completed");
        } else {
            p.finish("Extraction interrupted");
        }
    }

    if config.show_progress {
        print_summary(&result, &staging_dir);
    }

    info!(
        archives = result.archives_total,
        processed = result.totals.archives_processed,
        failed = result.totals.archives_failed,
        entries = result.totals.entries_written,
        "Extraction finished"
    );

    if !result.completed {
        warn!(
            not_attempted = result.archives_not_attempted(),
            "Extraction was interrupted; leaving the stack alone"
        );
        return Ok(());
    }

    if config.start_stack {
        ComposeStack::new(RESOURCES_DIR)
            .with_staging_dir(&staging_dir)
            .up()
            .context("Failed to start the ELK stack")?;
        info!("ELK stack started");
    }

    Ok(())
}

fn setup_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(runlog::filter(false))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn source_label(input: &InputSpec) -> String {
    match input {
        InputSpec::Directory(dir) => format!("{} (*.tar.gz)", dir.display()),
        InputSpec::File(file) => file.display().to_string(),
    }
}
