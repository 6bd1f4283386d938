//! Error types for tar splitting and parallel archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of the splitter, the parallel archiver and the merger, along
//! with a convenient [`Result<T>`] type alias.
//!
//! Every failure carries enough context (operation, path, underlying cause) to
//! be diagnosed from the message alone:
//!
//! ```rust
//! use tarsplitter::Error;
//!
//! fn print_user_message(error: &Error) {
//!     match error {
//!         Error::Io { path, .. } => println!("File error on {}: {}", path.display(), error),
//!         Error::CorruptArchive { .. } => println!("The source is not a valid tar archive."),
//!         Error::InvalidInput(msg) => println!("Invalid arguments: {}", msg),
//!         _ => println!("Error: {}", error),
//!     }
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// The main error type for split, archive and merge operations.
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Input | [`InvalidInput`][Self::InvalidInput], [`InvalidSize`][Self::InvalidSize] | Bad arguments |
/// | Stream | [`CorruptArchive`][Self::CorruptArchive], [`InvalidFragment`][Self::InvalidFragment] | Malformed tar data |
/// | I/O | [`Io`][Self::Io] | Disk full, permission denied, missing file |
/// | Workers | [`Worker`][Self::Worker] | A parallel archiver worker failed |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A filesystem operation failed.
    #[error("{operation} {}: {source}", path.display())]
    Io {
        /// What was being done (e.g. "opening", "writing part").
        operation: &'static str,
        /// The file the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source stream contains a malformed entry.
    ///
    /// Reading never attempts recovery: a truncated read would silently drop
    /// the remainder of the archive.
    #[error("corrupt archive {} at entry {entry_index}: {reason}", path.display())]
    CorruptArchive {
        /// The archive being read (`-` for standard input).
        path: PathBuf,
        /// Zero-based index of the entry that failed to parse.
        entry_index: usize,
        /// A description of the corruption.
        reason: String,
    },

    /// A fragment handed to the merger is not a terminated tar archive.
    #[error("invalid fragment {}: {reason}", path.display())]
    InvalidFragment {
        /// The fragment path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid arguments (non-positive part count, empty threshold, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A human-readable size could not be parsed.
    #[error("invalid size '{input}': {reason}")]
    InvalidSize {
        /// The text that was given.
        input: String,
        /// The parser's complaint.
        reason: String,
    },

    /// A parallel archiver worker failed; the whole run is aborted.
    #[error("worker {worker} failed: {source}")]
    Worker {
        /// Index of the failed worker (equals its fragment index).
        worker: usize,
        /// The worker's error.
        #[source]
        source: Box<Error>,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates an [`Error::Io`] for `path`.
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the underlying I/O error kind, looking through worker failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::Worker { source, .. } => source.io_kind(),
            _ => None,
        }
    }

    /// Returns true for input errors detected before any work is done.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidSize { .. })
    }
}

/// Attaches an operation and path to an [`io::Result`].
pub trait IoResultExt<T> {
    /// Converts the error into [`Error::Io`] with the given context.
    fn context(self, operation: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn context(self, operation: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| Error::io(operation, path, e))
    }
}
