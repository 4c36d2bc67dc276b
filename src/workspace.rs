//! Temporary sorting workspace.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SortError;

const WORKSPACE_PREFIX: &str = "large-sort-";
const CHUNKS_DIR: &str = "chunks";
const SORTED_DIR: &str = "sorted";

/// Uniquely named directory owned by a single sorting run.
///
/// Holds the `chunks/` (unsorted) and `sorted/` chunk directories. The whole tree is removed
/// when the workspace is dropped or closed.
pub struct Workspace {
    dir: tempfile::TempDir,
    chunks_dir: PathBuf,
    sorted_dir: PathBuf,
}

impl Workspace {
    /// Creates a new workspace in `tmp_path` or in the default OS temporary directory if [`None`].
    pub fn create(tmp_path: Option<&Path>) -> Result<Self, SortError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = if let Some(tmp_path) = tmp_path {
            builder.tempdir_in(tmp_path)
        } else {
            builder.tempdir()
        }
        .map_err(|err| SortError::TempDir(err))?;

        let chunks_dir = dir.path().join(CHUNKS_DIR);
        let sorted_dir = dir.path().join(SORTED_DIR);
        fs::create_dir(&chunks_dir).map_err(|err| SortError::TempDir(err))?;
        fs::create_dir(&sorted_dir).map_err(|err| SortError::TempDir(err))?;

        log::info!("using {} as a temporary directory", dir.path().display());

        return Ok(Workspace {
            dir,
            chunks_dir,
            sorted_dir,
        });
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory for unsorted chunks.
    pub fn chunks_dir(&self) -> &Path {
        &self.chunks_dir
    }

    /// Directory for sorted chunks.
    pub fn sorted_dir(&self) -> &Path {
        &self.sorted_dir
    }

    /// Removes the workspace, reporting removal errors that dropping would ignore.
    pub fn close(self) -> Result<(), SortError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|err| SortError::TempDir(err))?;
        log::debug!("temporary directory {} removed", path.display());

        return Ok(());
    }
}
