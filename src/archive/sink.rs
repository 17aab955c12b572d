//! Flat staging directory
//!
//! Every staged entry lands directly in one directory under its base name.
//! Writes go to a hidden temporary file next to the target and are renamed
//! into place, so a name shared by several entries ends up holding exactly
//! one complete copy: whichever rename happened last. An interrupted copy
//! leaves nothing behind.

use crate::error::{EntryError, Result, StagerError};
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-flight temporary files
const PARTIAL_SUFFIX: &str = ".partial";

/// Mode of staged files; the ingesting container reads them as another uid
#[cfg(unix)]
const STAGED_FILE_MODE: u32 = 0o644;

/// The staging directory receiving extracted entries
#[derive(Debug, Clone)]
pub struct StagingSink {
    dir: PathBuf,
}

impl StagingSink {
    /// Create the staging directory (recursively, idempotent) and return a sink for it
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StagerError::Staging {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Staging directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for a staged name
    pub fn target_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Stream `reader` into the staged file `name`, replacing any previous file
    ///
    /// Returns the number of bytes written.
    pub fn write_entry<R: Read + ?Sized>(
        &self,
        name: &str,
        reader: &mut R,
    ) -> std::result::Result<u64, EntryError> {
        let target = self.target_path(name);

        let temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|source| EntryError::Create {
                path: target.clone(),
                source,
            })?;

        let mut writer = BufWriter::new(temp);
        let bytes = io::copy(reader, &mut writer).map_err(|source| EntryError::Copy {
            path: target.clone(),
            source,
        })?;
        writer.flush().map_err(|source| EntryError::Copy {
            path: target.clone(),
            source,
        })?;

        let temp = writer.into_inner().map_err(|e| EntryError::Copy {
            path: target.clone(),
            source: e.into_error(),
        })?;

        // tempfile creates 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(STAGED_FILE_MODE))
                .map_err(|source| EntryError::Create {
                    path: target.clone(),
                    source,
                })?;
        }

        temp.persist(&target).map_err(|e| EntryError::Create {
            path: target.clone(),
            source: e.error,
        })?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Reader that fails after yielding a few bytes
    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated entry"));
            }
            self.served = true;
            buf[..3].copy_from_slice(b"{\"x");
            Ok(3)
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("a/b/json_logs");

        StagingSink::create(&staging).unwrap();
        StagingSink::create(&staging).unwrap();
        assert!(staging.is_dir());
    }

    #[test]
    fn test_create_fails_under_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let err = StagingSink::create(blocker.join("json_logs")).unwrap_err();
        assert!(matches!(err, StagerError::Staging { .. }));
    }

    #[test]
    fn test_write_and_overwrite() {
        let dir = tempdir().unwrap();
        let sink = StagingSink::create(dir.path()).unwrap();

        let written = sink.write_entry("a.json", &mut Cursor::new(b"{\"x\":1}")).unwrap();
        assert_eq!(written, 7);
        sink.write_entry("a.json", &mut Cursor::new(b"{\"x\":22}")).unwrap();

        assert_eq!(fs::read(dir.path().join("a.json")).unwrap(), b"{\"x\":22}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_staged_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let sink = StagingSink::create(dir.path()).unwrap();
        sink.write_entry("a.json", &mut Cursor::new(b"{}")).unwrap();

        let mode = fs::metadata(dir.path().join("a.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, STAGED_FILE_MODE);
    }

    #[test]
    fn test_failed_copy_leaves_no_file() {
        let dir = tempdir().unwrap();
        let sink = StagingSink::create(dir.path()).unwrap();

        let err = sink
            .write_entry("a.json", &mut FailingReader { served: false })
            .unwrap_err();
        assert!(matches!(err, EntryError::Copy { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
