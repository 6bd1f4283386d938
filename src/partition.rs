//! Dividing a path list into contiguous work units.

use std::path::PathBuf;

use crate::{Error, Result};

/// A contiguous slice of the input path list assigned to one worker.
///
/// Units borrow from the shared list; workers only ever read from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit<'a> {
    /// Worker (and fragment) index.
    pub index: usize,
    /// Offset of the first path in the full list.
    pub start: usize,
    /// The assigned paths, in listing order.
    pub paths: &'a [PathBuf],
}

impl WorkUnit<'_> {
    /// Number of assigned paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no paths were assigned.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Splits `paths` into exactly `worker_count` contiguous groups.
///
/// Every group holds `ceil(len / worker_count)` paths except the trailing
/// ones, which may be shorter or empty. Output is deterministic for a given
/// input order.
///
/// ```rust
/// use std::path::PathBuf;
/// use tarsplitter::partition::partition;
///
/// let paths: Vec<PathBuf> = (0..7).map(|i| PathBuf::from(format!("f{}", i))).collect();
/// let units = partition(&paths, 3).unwrap();
/// let sizes: Vec<usize> = units.iter().map(|u| u.len()).collect();
/// assert_eq!(sizes, vec![3, 3, 1]);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `worker_count` is zero.
pub fn partition(paths: &[PathBuf], worker_count: usize) -> Result<Vec<WorkUnit<'_>>> {
    if worker_count == 0 {
        return Err(Error::InvalidInput(
            "worker count must be greater than zero".into(),
        ));
    }

    let group_size = paths.len().div_ceil(worker_count);
    let units = (0..worker_count)
        .map(|index| {
            let start = (index * group_size).min(paths.len());
            let end = ((index + 1) * group_size).min(paths.len());
            WorkUnit {
                index,
                start,
                paths: &paths[start..end],
            }
        })
        .collect();

    Ok(units)
}
