//! Filesystem collaborator. Wraps `std::fs` behind a trait so the
//! filesystem suggester and txtar tests can substitute an in-memory fixture.

use core_errors::ShellError;
use std::path::{Path, PathBuf};

pub trait FsProvider: Send + Sync {
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, ShellError>;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
}

#[derive(Default)]
pub struct StdFsProvider;

impl StdFsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FsProvider for StdFsProvider {
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, ShellError> {
        let entries = std::fs::read_dir(path)
            .map_err(|e| ShellError::io_failure(format!("read_dir {}", path.display()), e))?;
        entries
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| ShellError::io_failure(format!("read_dir {}", path.display()), e))
            })
            .collect()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}
