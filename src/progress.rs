//! Progress reporting for split and archive operations.
//!
//! Reporters are shared by reference between parallel archive workers, so the
//! hooks take `&self` and implementations use interior mutability.
//!
//! # Example
//!
//! ```rust
//! use tarsplitter::progress::{AtomicProgress, ProgressReporter};
//!
//! let progress = AtomicProgress::new();
//! progress.on_entry("a.txt", 10);
//! progress.on_entry("b.txt", 20);
//! assert_eq!(progress.entries(), 2);
//! assert_eq!(progress.bytes(), 30);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::split::ArchivePart;

/// Progress reporting hooks.
///
/// Every method has a no-op default.
pub trait ProgressReporter: Send + Sync {
    /// Called when the splitter opens a new part.
    fn on_part_start(&self, index: usize, path: &Path) {
        let _ = (index, path);
    }

    /// Called after an entry has been written to a part or a fragment.
    ///
    /// For the splitter `size` is the part's observed growth (extension
    /// headers, entry header, body and padding); for archive workers it is
    /// the file body size.
    fn on_entry(&self, entry_name: &str, size: u64) {
        let _ = (entry_name, size);
    }

    /// Called when the splitter closes a part.
    fn on_part_complete(&self, part: &ArchivePart) {
        let _ = part;
    }

    /// Called when an archive worker has finished its fragment.
    fn on_fragment_complete(&self, index: usize, entries: usize) {
        let _ = (index, entries);
    }

    /// Called on any warning during processing.
    fn on_warning(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op progress reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Thread-safe counters for progress polling from another thread.
#[derive(Debug)]
pub struct AtomicProgress {
    entries: AtomicUsize,
    bytes: AtomicU64,
    parts: AtomicUsize,
    fragments: AtomicUsize,
    warnings: AtomicUsize,
    start_time: Instant,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgress {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self {
            entries: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
            parts: AtomicUsize::new(0),
            fragments: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Entries written so far.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Entry body bytes written so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Parts completed by the splitter.
    pub fn parts(&self) -> usize {
        self.parts.load(Ordering::Relaxed)
    }

    /// Fragments completed by archive workers.
    pub fn fragments(&self) -> usize {
        self.fragments.load(Ordering::Relaxed)
    }

    /// Warnings reported.
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Time since creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Entry body throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes() as f64 / secs
        } else {
            0.0
        }
    }
}

impl ProgressReporter for AtomicProgress {
    fn on_entry(&self, _entry_name: &str, size: u64) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    fn on_part_complete(&self, _part: &ArchivePart) {
        self.parts.fetch_add(1, Ordering::Relaxed);
    }

    fn on_fragment_complete(&self, _index: usize, _entries: usize) {
        self.fragments.fetch_add(1, Ordering::Relaxed);
    }

    fn on_warning(&self, _message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }
}
