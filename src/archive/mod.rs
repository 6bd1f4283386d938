//! Building one large archive from many paths with parallel workers.
//!
//! The path list is cut into one contiguous [`WorkUnit`] per worker. Every
//! worker writes its own fragment archive next to the output; workers share
//! nothing but the read-only path list. Once all of them have finished, the
//! fragments are merged in index order into the output and deleted.
//!
//! A failing worker or a failing merge fails the whole run: the remaining
//! fragments are removed and no output is produced.
//!
//! # Example
//!
//! ```rust,no_run
//! use tarsplitter::archive::create_from_dir;
//! use tarsplitter::config::ArchiveOptions;
//! use tarsplitter::progress::NoProgress;
//!
//! let options = ArchiveOptions::new().workers(8)?.strip_prefix("data");
//! let result = create_from_dir("data", "data.tar", &options, &NoProgress)?;
//! println!("{} entries, {} bytes", result.entries(), result.bytes_written);
//! # Ok::<(), tarsplitter::Error>(())
//! ```

mod fragment;

pub use fragment::{FragmentResult, build_fragment, entry_name, fragment_path};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::ArchiveOptions;
use crate::merge::merge;
use crate::partition::{WorkUnit, partition};
use crate::progress::ProgressReporter;
use crate::sources::{collect_from_dir, path_list_path, write_path_list};
use crate::{Error, Result};

/// Result of an archive run.
#[derive(Debug, Clone)]
pub struct ArchiveResult {
    /// The merged archive.
    pub output: PathBuf,
    /// Per-worker outcomes in index order.
    pub fragments: Vec<FragmentResult>,
    /// Size of the merged archive.
    pub bytes_written: u64,
}

impl ArchiveResult {
    /// Entries in the merged archive.
    pub fn entries(&self) -> usize {
        self.fragments.iter().map(|f| f.entries).sum()
    }

    /// Files left out under the skip policy.
    pub fn skipped(&self) -> usize {
        self.fragments.iter().map(|f| f.skipped).sum()
    }
}

/// Archives `paths` into `output` using `options.workers` parallel workers.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for a zero worker count or an unusable entry name
/// - [`Error::Worker`] wrapping the first worker failure
/// - [`Error::Io`] / [`Error::InvalidFragment`] from the merge
pub fn create(
    paths: &[PathBuf],
    output: impl AsRef<Path>,
    options: &ArchiveOptions,
    progress: &dyn ProgressReporter,
) -> Result<ArchiveResult> {
    let output = output.as_ref();
    let workers = options.workers.count();
    let units = partition(paths, workers)?;
    log::info!(
        "Archiving {} paths with {} workers, partition sizes {:?}",
        paths.len(),
        workers,
        units.iter().map(WorkUnit::len).collect::<Vec<_>>()
    );

    let fragment_paths: Vec<PathBuf> = (0..workers).map(|i| fragment_path(output, i)).collect();

    let fragments = match build_all(&units, &fragment_paths, output, options, progress) {
        Ok(fragments) => fragments,
        Err(e) => {
            remove_fragments(&fragment_paths);
            return Err(e);
        }
    };

    let bytes_written = match merge(&fragment_paths, output) {
        Ok(bytes) => bytes,
        Err(e) => {
            remove_fragments(&fragment_paths);
            return Err(e);
        }
    };

    Ok(ArchiveResult {
        output: output.to_path_buf(),
        fragments,
        bytes_written,
    })
}

/// Walks `root`, records the path list in `<output>.txt`, and archives it.
pub fn create_from_dir(
    root: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ArchiveOptions,
    progress: &dyn ProgressReporter,
) -> Result<ArchiveResult> {
    let output = output.as_ref();
    let paths = collect_from_dir(root)?;
    write_path_list(&paths, path_list_path(output))?;
    create(&paths, output, options, progress)
}

fn worker_error(worker: usize) -> impl Fn(Error) -> Error {
    move |e| Error::Worker {
        worker,
        source: Box::new(e),
    }
}

/// Runs one worker per unit on a dedicated pool; the join happens before
/// returning. Results are in index order.
#[cfg(feature = "parallel")]
fn build_all(
    units: &[WorkUnit<'_>],
    fragment_paths: &[PathBuf],
    output: &Path,
    options: &ArchiveOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<FragmentResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(units.len())
        .build()
        .map_err(|e| Error::io("starting workers for", output, io::Error::other(e)))?;

    pool.install(|| {
        units
            .par_iter()
            .zip(fragment_paths.par_iter())
            .map(|(unit, path)| {
                build_fragment(unit, path, options, progress).map_err(worker_error(unit.index))
            })
            .collect()
    })
}

/// Sequential fallback when built without the `parallel` feature.
#[cfg(not(feature = "parallel"))]
fn build_all(
    units: &[WorkUnit<'_>],
    fragment_paths: &[PathBuf],
    _output: &Path,
    options: &ArchiveOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<FragmentResult>> {
    units
        .iter()
        .zip(fragment_paths)
        .map(|(unit, path)| {
            build_fragment(unit, path, options, progress).map_err(worker_error(unit.index))
        })
        .collect()
}

fn remove_fragments(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => log::debug!("Removed fragment {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove fragment {}: {}", path.display(), e),
        }
    }
}
