//! Options for splitting and parallel archiving.
//!
//! Options are plain values built once with builder-style setters and passed
//! by reference to every component:
//!
//! ```rust
//! use tarsplitter::config::{ArchiveOptions, ReadFailurePolicy, SplitOptions, Threshold};
//!
//! let split = SplitOptions::new().threshold(Threshold::PartCount(8));
//! assert_eq!(split.threshold, Threshold::PartCount(8));
//!
//! let archive = ArchiveOptions::new()
//!     .workers(4)
//!     .unwrap()
//!     .read_failure(ReadFailurePolicy::Skip);
//! assert_eq!(archive.workers.count(), 4);
//! ```

use std::num::NonZeroUsize;
use std::path::PathBuf;

use byte_unit::Byte;

use crate::{Error, Result};

/// Number of parts used when neither a part count nor a part size is given.
pub const DEFAULT_PART_COUNT: u64 = 4;

/// How the splitter decides where one part ends.
///
/// Exactly one form is active per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Split into roughly this many parts: the source size divided evenly.
    PartCount(u64),
    /// Close a part once it would grow past this many bytes.
    PartSize(u64),
}

impl Default for Threshold {
    fn default() -> Self {
        Self::PartCount(DEFAULT_PART_COUNT)
    }
}

impl Threshold {
    /// Builds a threshold from the two optional command-line forms.
    ///
    /// Falls back to [`DEFAULT_PART_COUNT`] when both are absent.
    pub fn from_parts(part_count: Option<u64>, part_size: Option<u64>) -> Result<Self> {
        let threshold = match (part_count, part_size) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "part count and part size are mutually exclusive".into(),
                ));
            }
            (Some(count), None) => Self::PartCount(count),
            (None, Some(size)) => Self::PartSize(size),
            (None, None) => Self::default(),
        };
        threshold.validate()?;
        Ok(threshold)
    }

    /// Rejects non-positive counts and sizes.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::PartCount(0) => Err(Error::InvalidInput(
                "part count must be greater than zero".into(),
            )),
            Self::PartSize(0) => Err(Error::InvalidInput(
                "part size must be greater than zero".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns the per-part byte threshold.
    ///
    /// A part count needs the source size; streams of unknown length can only
    /// be split by part size.
    pub fn resolve(&self, source_size: Option<u64>) -> Result<u64> {
        self.validate()?;
        match *self {
            Self::PartSize(size) => Ok(size),
            Self::PartCount(count) => {
                let size = source_size.ok_or_else(|| {
                    Error::InvalidInput(
                        "splitting by part count requires a source of known size".into(),
                    )
                })?;
                Ok((size / count).max(1))
            }
        }
    }
}

/// Parses a byte size such as `1048576`, `500MB`, `1.5 GiB` or `2G`.
///
/// Decimal suffixes (`KB`, `MB`, `G`) are powers of 1000, binary suffixes
/// (`KiB`, `MiB`, `GiB`) powers of 1024. Zero is rejected.
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let bytes = match trimmed.parse::<u64>() {
        Ok(n) => n,
        Err(_) => {
            let byte = Byte::from_str(trimmed).map_err(|e| Error::InvalidSize {
                input: input.to_string(),
                reason: e.to_string(),
            })?;
            u64::try_from(byte.get_bytes()).map_err(|_| Error::InvalidSize {
                input: input.to_string(),
                reason: "size does not fit in 64 bits".into(),
            })?
        }
    };

    if bytes == 0 {
        return Err(Error::InvalidSize {
            input: input.to_string(),
            reason: "size must be greater than zero".into(),
        });
    }
    Ok(bytes)
}

/// What an archive worker does with a source file it cannot open or stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFailurePolicy {
    /// Fail the worker, and with it the whole run.
    #[default]
    Abort,
    /// Log a warning and leave the file out of the archive.
    ///
    /// Only failures before the entry header is written can be skipped; a
    /// read error in the middle of a body is always fatal.
    Skip,
}

/// Number of parallel archive workers (one fragment per worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Workers {
    /// One worker per available CPU.
    #[default]
    Auto,
    /// A fixed number of workers.
    Count(NonZeroUsize),
}

impl Workers {
    /// Creates a fixed worker count, rejecting zero.
    pub fn try_count(n: usize) -> Result<Self> {
        NonZeroUsize::new(n)
            .map(Self::Count)
            .ok_or_else(|| Error::InvalidInput("worker count must be greater than zero".into()))
    }

    /// Returns the actual worker count (always at least 1).
    pub fn count(&self) -> usize {
        match self {
            Self::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Self::Count(n) => n.get(),
        }
    }
}

/// Options for [`split`](crate::split).
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Where parts end.
    pub threshold: Threshold,
}

impl SplitOptions {
    /// Creates split options with the default threshold (four parts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the threshold.
    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Options for [`archive`](crate::archive).
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Worker count; also the number of fragments.
    pub workers: Workers,
    /// Handling of unreadable source files.
    pub read_failure: ReadFailurePolicy,
    /// Prefix removed from source paths to form entry names.
    pub strip_prefix: Option<PathBuf>,
}

impl ArchiveOptions {
    /// Creates archive options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed worker count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `count` is zero.
    pub fn workers(mut self, count: usize) -> Result<Self> {
        self.workers = Workers::try_count(count)?;
        Ok(self)
    }

    /// Sets the unreadable-file policy.
    pub fn read_failure(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// Sets the prefix stripped from entry names.
    pub fn strip_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }
}
