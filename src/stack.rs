//! Downstream ELK stack
//!
//! Thin wrapper over `docker compose` plus the compose/pipeline assets that
//! are compiled into the binary. Extraction never depends on anything here;
//! `main` calls it after the pool has returned.

use crate::error::StackError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Compose file name inside the stack working directory
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Variable the compose file reads the staging mount from
pub const STAGING_DIR_VAR: &str = "STAGING_DIR";

/// Assets written into the stack working directory, relative path and contents
const ASSETS: &[(&str, &str)] = &[
    (COMPOSE_FILE, include_str!("../resources/elk/docker-compose.yml")),
    (
        "logstash/pipeline/logstash.conf",
        include_str!("../resources/elk/logstash/pipeline/logstash.conf"),
    ),
];

/// Write the bundled assets into `dest`, replacing older copies
pub fn provision_assets(dest: &Path) -> Result<Vec<PathBuf>, StackError> {
    let mut written = Vec::with_capacity(ASSETS.len());

    for (relative, contents) in ASSETS {
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| StackError::Assets {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, contents).map_err(|source| StackError::Assets {
            path: target.clone(),
            source,
        })?;
        debug!(path = %target.display(), "Asset provisioned");
        written.push(target);
    }

    Ok(written)
}

/// The compose project that ingests the staging directory
#[derive(Debug, Clone)]
pub struct ComposeStack {
    /// Stack working directory holding the compose file
    work_dir: PathBuf,

    /// Executable invoked as `<program> compose -f <file> ...`
    program: String,

    /// Host directory mounted as the ingest source; `./json_logs` when unset
    staging_dir: Option<PathBuf>,
}

impl ComposeStack {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            program: "docker".to_string(),
            staging_dir: None,
        }
    }

    /// Mount `dir` instead of `<work_dir>/json_logs`
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Use another executable in place of `docker`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn compose_file(&self) -> PathBuf {
        self.work_dir.join(COMPOSE_FILE)
    }

    /// Provision assets and start the stack detached
    pub fn up(&self) -> Result<(), StackError> {
        provision_assets(&self.work_dir)?;
        self.compose(&["up", "-d"])
    }

    /// Stop the stack
    pub fn down(&self) -> Result<(), StackError> {
        self.compose(&["down"])
    }

    /// Stop the stack, drop its volumes and delete `paths`
    ///
    /// Paths that do not exist are ignored.
    pub fn purge(&self, paths: &[&Path]) -> Result<(), StackError> {
        self.compose(&["down", "-v"])?;

        for path in paths {
            let removed = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            match removed {
                Ok(()) => info!(path = %path.display(), "Removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StackError::Assets {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }

        Ok(())
    }

    fn compose(&self, args: &[&str]) -> Result<(), StackError> {
        let compose_file = self.compose_file();
        let mut command = Command::new(&self.program);
        command.arg("compose").arg("-f").arg(&compose_file).args(args);

        if let Some(dir) = &self.staging_dir {
            // Compose resolves relative paths against the compose file, not our cwd
            let dir = fs::canonicalize(dir).map_err(|source| StackError::Assets {
                path: dir.clone(),
                source,
            })?;
            command.env(STAGING_DIR_VAR, dir);
        }

        let rendered = format!(
            "{} compose -f {} {}",
            self.program,
            compose_file.display(),
            args.join(" ")
        );
        info!(command = %rendered, "Running");

        let status = command.status().map_err(|source| StackError::Launch {
            command: rendered.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(StackError::CommandFailed {
                command: rendered,
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_provision_assets() {
        let dir = tempdir().unwrap();
        let written = provision_assets(dir.path()).unwrap();

        assert_eq!(written.len(), ASSETS.len());
        let compose = fs::read_to_string(dir.path().join(COMPOSE_FILE)).unwrap();
        assert!(compose.contains("json_logs"));
        assert!(dir.path().join("logstash/pipeline/logstash.conf").is_file());

        // Idempotent
        provision_assets(dir.path()).unwrap();
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let dir = tempdir().unwrap();
        let stack = ComposeStack::new(dir.path()).with_program("definitely-not-a-real-binary-xyz");
        assert!(matches!(stack.down(), Err(StackError::Launch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command() {
        let dir = tempdir().unwrap();
        let stack = ComposeStack::new(dir.path()).with_program("false");
        assert!(matches!(stack.down(), Err(StackError::CommandFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_purge_removes_paths() {
        let dir = tempdir().unwrap();
        let resources = dir.path().join(".resources");
        let log = dir.path().join("run.log");
        fs::create_dir_all(resources.join("elk/json_logs")).unwrap();
        fs::write(&log, b"line\n").unwrap();

        let stack = ComposeStack::new(resources.join("elk")).with_program("true");
        let missing = dir.path().join("missing");
        stack
            .purge(&[resources.as_path(), log.as_path(), missing.as_path()])
            .unwrap();

        assert!(!resources.exists());
        assert!(!log.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_up_exports_staging_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let staging = dir.path().join("elsewhere");
        fs::create_dir(&staging).unwrap();

        let program = dir.path().join("fake-docker");
        let seen = dir.path().join("seen.txt");
        fs::write(
            &program,
            format!("#!/bin/sh\necho \"${}\" > {}\n", STAGING_DIR_VAR, seen.display()),
        )
        .unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        ComposeStack::new(dir.path().join("elk"))
            .with_program(program.to_string_lossy())
            .with_staging_dir(&staging)
            .up()
            .unwrap();

        let exported = fs::read_to_string(&seen).unwrap();
        assert_eq!(exported.trim_end(), fs::canonicalize(&staging).unwrap().to_str().unwrap());
    }
}
