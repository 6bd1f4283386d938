//! # tarsplitter
//!
//! Splitting large tar archives into smaller ones, and building one large tar
//! archive from many files in parallel.
//!
//! Both directions work on uncompressed POSIX/GNU tar streams. Entries are
//! copied whole: an entry is never split across two parts, and the relative
//! order of entries is preserved.
//!
//! ## Quick Start
//!
//! ### Splitting an Archive
//!
//! ```rust,no_run
//! use tarsplitter::{NoProgress, SplitOptions, Threshold, split_path};
//!
//! fn main() -> tarsplitter::Result<()> {
//!     // Four parts of roughly equal size
//!     let options = SplitOptions::new().threshold(Threshold::PartCount(4));
//!     let result = split_path("huge.tar", "parts/huge-", &options, &NoProgress)?;
//!
//!     for part in &result.parts {
//!         println!("{}: {} entries, {} bytes", part.path.display(), part.entries, part.bytes);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Parts are named `<prefix><index>.tar` starting from index 0. Use
//! [`Threshold::PartSize`] for a byte limit instead of a part count; a
//! [`config::parse_size`] helper understands sizes like `"500MB"` or `"1 GiB"`.
//!
//! ### Archiving a Directory
//!
//! ```rust,no_run
//! use tarsplitter::{ArchiveOptions, NoProgress, create_from_dir};
//!
//! fn main() -> tarsplitter::Result<()> {
//!     let options = ArchiveOptions::new().workers(8)?.strip_prefix("dataset");
//!     let result = create_from_dir("dataset", "dataset.tar", &options, &NoProgress)?;
//!     println!("{} entries, {} bytes", result.entries(), result.bytes_written);
//!     Ok(())
//! }
//! ```
//!
//! Each worker writes a fragment archive (`<output>.000`, `<output>.001`, ...)
//! which are concatenated into the output once every worker has finished.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `parallel` | Yes | Archive workers on a Rayon thread pool |
//! | `cli` | No | Command-line interface tool |
//!
//! Without `parallel` the workers run one after another; the output is the
//! same.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. I/O failures carry the operation and
//! path that failed:
//!
//! ```rust,no_run
//! use tarsplitter::{Error, NoProgress, SplitOptions, split_path};
//!
//! match split_path("huge.tar", "out-", &SplitOptions::new(), &NoProgress) {
//!     Ok(result) => println!("{} parts", result.parts.len()),
//!     Err(Error::CorruptArchive { entry_index, reason, .. }) => {
//!         eprintln!("bad entry #{}: {}", entry_index, reason)
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive;
pub mod config;
pub mod error;
pub mod format;
pub mod merge;
pub mod partition;
pub mod progress;
pub mod sources;
pub mod split;

pub use error::{Error, Result};

pub use config::{ArchiveOptions, ReadFailurePolicy, SplitOptions, Threshold, Workers};

pub use split::{ArchivePart, SplitResult, should_rotate, split_path, split_reader};

pub use partition::{WorkUnit, partition};

pub use merge::merge;

pub use archive::{ArchiveResult, FragmentResult, create, create_from_dir};

pub use progress::{AtomicProgress, NoProgress, ProgressReporter};
