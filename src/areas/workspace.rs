//! Working directory operations
//!
//! The workspace walks the worktree for untracked-file detection and stats
//! individual files for change detection. The `.git` directory is skipped
//! at the walk site.

use crate::artifacts::index::index_entry::FileStat;
use crate::errors::{GitError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const GIT_DIR_NAME: &str = ".git";

/// A handle on the working-copy directory.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All files under the worktree, as sorted paths relative to its root.
    ///
    /// The walk is depth-first and skips everything under `.git`.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.path)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GIT_DIR_NAME);
        for entry in walker {
            let entry = entry.map_err(|error| {
                GitError::Io(error.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "worktree walk failed")
                }))
            })?;
            if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(self.path.as_ref()) {
                files.push(relative.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Stat a file relative to the worktree root.
    pub fn stat_file(&self, file_path: &Path) -> Result<FileStat> {
        let absolute = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&absolute)?;

        (absolute.as_path(), &metadata).try_into()
    }

    /// Read a file's content relative to the worktree root.
    pub fn read_file(&self, file_path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.path.join(file_path))?)
    }
}
