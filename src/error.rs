//! Sorting error.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use crate::chunk::ChunkReadError;
use crate::merger::MergeError;
use crate::record::ParseError;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Temporary workspace creation or removal error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Common I/O error.
    IO(io::Error),
    /// Chunk line is not a valid record.
    Parse {
        path: PathBuf,
        line: usize,
        source: ParseError,
    },
    /// Sorted chunk could not be advanced during the merge.
    Merge(MergeError<ChunkReadError>),
    /// Invalid sorter configuration or input.
    Validation(String),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::TempDir(err) => Some(err),
            SortError::ThreadPoolBuildError(err) => Some(err),
            SortError::IO(err) => Some(err),
            SortError::Parse { source, .. } => Some(source),
            SortError::Merge(err) => Some(err),
            SortError::Validation(_) => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory not created or removed: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Parse { path, line, source } => {
                write!(f, "{}:{}: record parsing error: {}", path.display(), line, source)
            }
            SortError::Merge(err) => write!(f, "chunk merge failed: {}", err),
            SortError::Validation(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl From<io::Error> for SortError {
    fn from(err: io::Error) -> Self {
        SortError::IO(err)
    }
}

impl From<MergeError<ChunkReadError>> for SortError {
    fn from(err: MergeError<ChunkReadError>) -> Self {
        SortError::Merge(err)
    }
}
