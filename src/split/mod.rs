//! Splitting one tar archive into size-bounded parts.
//!
//! The source is streamed entry by entry. Before each entry is written the
//! splitter asks [`should_rotate`] whether the current part can take it; if
//! not, the part is closed and the entry goes to a fresh one. Part sizes are
//! tracked from the observed growth of the part file, so header blocks and
//! block padding count toward the threshold.
//!
//! GNU long-name and PAX headers travel with the entry that follows them and
//! are never separated from it by a rotation.
//!
//! # Example
//!
//! ```rust,no_run
//! use tarsplitter::config::{SplitOptions, Threshold};
//! use tarsplitter::progress::NoProgress;
//! use tarsplitter::split::split_path;
//!
//! let options = SplitOptions::new().threshold(Threshold::PartCount(4));
//! let result = split_path("big.tar", "out/big-", &options, &NoProgress)?;
//! for part in &result.parts {
//!     println!("{}: {} entries", part.path.display(), part.entries);
//! }
//! # Ok::<(), tarsplitter::Error>(())
//! ```

mod part;

pub use part::{ArchivePart, part_path};

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config::SplitOptions;
use crate::error::IoResultExt;
use crate::format::{entry_footprint, is_extension_header};
use crate::progress::ProgressReporter;
use crate::{Error, READ_BUFFER_SIZE, Result};
use part::PartWriter;

/// Source path that selects standard input.
pub const STDIN_PATH: &str = "-";

/// An info line is logged every this many entries.
pub const PROGRESS_LOG_INTERVAL: usize = 10_000;

/// Decides whether the current part must be closed before writing an entry.
///
/// An empty part always accepts its first entry, so an entry larger than the
/// threshold ends up alone in a part. Once a part has grown past the
/// threshold, every further entry rotates, including zero-byte ones.
///
/// ```rust
/// use tarsplitter::split::should_rotate;
///
/// assert!(!should_rotate(0, 5000, 1000));
/// assert!(!should_rotate(400, 600, 1000));
/// assert!(should_rotate(400, 601, 1000));
/// assert!(should_rotate(1200, 0, 1000));
/// ```
pub fn should_rotate(current_size: u64, entry_size: u64, threshold: u64) -> bool {
    current_size > 0 && current_size.saturating_add(entry_size) > threshold
}

/// Result of a split.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Parts in index order.
    pub parts: Vec<ArchivePart>,
    /// Entries copied from the source (extension headers not counted).
    pub entries: usize,
    /// The per-part byte threshold that was applied.
    pub threshold: u64,
}

impl SplitResult {
    /// Paths of all parts in index order.
    pub fn part_paths(&self) -> Vec<PathBuf> {
        self.parts.iter().map(|p| p.path.clone()).collect()
    }

    /// Sum of the parts' observed entry bytes.
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.bytes).sum()
    }
}

/// Splits the archive at `source` (or standard input for `-`) into parts
/// named `<prefix><N>.tar`.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for a zero threshold, or a part count on stdin
/// - [`Error::Io`] if the source cannot be opened or a part cannot be written
/// - [`Error::CorruptArchive`] on a malformed source entry
pub fn split_path(
    source: impl AsRef<Path>,
    prefix: impl AsRef<Path>,
    options: &SplitOptions,
    progress: &dyn ProgressReporter,
) -> Result<SplitResult> {
    let source = source.as_ref();
    options.threshold.validate()?;

    if source == Path::new(STDIN_PATH) {
        let threshold = options.threshold.resolve(None)?;
        log::info!("Splitting standard input into parts of {} bytes", threshold);
        let stdin = io::stdin();
        return split_reader(stdin.lock(), source, prefix.as_ref(), threshold, progress);
    }

    let file = File::open(source).context("opening", source)?;
    let size = file.metadata().context("statting", source)?.len();
    let threshold = options.threshold.resolve(Some(size))?;
    log::info!(
        "{} is {} bytes, splitting into parts of {} bytes",
        source.display(),
        size,
        threshold
    );

    split_reader(
        BufReader::with_capacity(READ_BUFFER_SIZE, file),
        source,
        prefix.as_ref(),
        threshold,
        progress,
    )
}

/// Splits a tar stream into parts of at most `threshold` bytes each (soft
/// bound: a part only exceeds it when a single entry group does).
///
/// `source` names the stream in error messages. On failure every part file
/// created by this call is removed again.
pub fn split_reader<R: Read>(
    reader: R,
    source: &Path,
    prefix: &Path,
    threshold: u64,
    progress: &dyn ProgressReporter,
) -> Result<SplitResult> {
    if threshold == 0 {
        return Err(Error::InvalidInput(
            "part size must be greater than zero".into(),
        ));
    }
    let prefix = std::path::absolute(prefix).context("resolving output prefix", prefix)?;

    let mut created = Vec::new();
    let result = write_parts(reader, source, &prefix, threshold, progress, &mut created);
    if result.is_err() {
        remove_parts(&created);
    }
    result
}

/// The split loop. Paths of created parts are recorded in `created` as soon
/// as the files exist; the open part is dropped before this returns.
fn write_parts<R: Read>(
    reader: R,
    source: &Path,
    prefix: &Path,
    threshold: u64,
    progress: &dyn ProgressReporter,
    created: &mut Vec<PathBuf>,
) -> Result<SplitResult> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().context("reading", source)?.raw(true);

    let mut parts = Vec::new();
    let mut part = PartWriter::create(prefix, 0)?;
    created.push(part.path().to_path_buf());
    progress.on_part_start(part.index(), part.path());

    let mut pending: Vec<(tar::Header, Vec<u8>)> = Vec::new();
    let mut processed = 0usize;

    for entry in entries {
        let corrupt = |e: io::Error| Error::CorruptArchive {
            path: source.to_path_buf(),
            entry_index: processed,
            reason: e.to_string(),
        };
        let mut entry = entry.map_err(corrupt)?;
        let header = entry.header().clone();
        let size = entry.size();

        if is_extension_header(header.entry_type()) {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(corrupt)?;
            pending.push((header, data));
            continue;
        }

        let name = entry_name(&header, &pending);
        let group_size = pending
            .iter()
            .map(|(_, data)| entry_footprint(data.len() as u64))
            .sum::<u64>()
            .saturating_add(size);

        if should_rotate(part.observed_size(), group_size, threshold) {
            let next_index = part.index() + 1;
            let finished = part.finish()?;
            progress.on_part_complete(&finished);
            parts.push(finished);

            part = PartWriter::create(prefix, next_index)?;
            created.push(part.path().to_path_buf());
            progress.on_part_start(part.index(), part.path());
        }

        let before = part.observed_size();
        for (ext_header, data) in pending.drain(..) {
            part.append_extension(&ext_header, &data)?;
        }
        part.append_entry(&header, size, &mut entry, source, processed)?;
        let written = part.commit_entry(before)?;
        log::debug!("{} -> part {} ({} bytes)", name, part.index(), written);
        progress.on_entry(&name, written);

        processed += 1;
        if processed % PROGRESS_LOG_INTERVAL == 0 {
            log::info!("Processed files={}", processed);
        }
    }

    if !pending.is_empty() {
        return Err(Error::CorruptArchive {
            path: source.to_path_buf(),
            entry_index: processed,
            reason: "extension header not followed by an entry".into(),
        });
    }

    log::info!("Done reading input archive");
    let finished = part.finish()?;
    progress.on_part_complete(&finished);
    parts.push(finished);

    Ok(SplitResult {
        parts,
        entries: processed,
        threshold,
    })
}

fn remove_parts(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => log::debug!("Removed incomplete part {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove part {}: {}", path.display(), e),
        }
    }
}

/// Best display name for an entry: a preceding GNU long name wins over the
/// truncated header name.
fn entry_name(header: &tar::Header, pending: &[(tar::Header, Vec<u8>)]) -> String {
    pending
        .iter()
        .rev()
        .find(|(h, _)| h.entry_type() == tar::EntryType::GNULongName)
        .map(|(_, data)| {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            String::from_utf8_lossy(&data[..end]).into_owned()
        })
        .unwrap_or_else(|| String::from_utf8_lossy(&header.path_bytes()).into_owned())
}
