//! Progress bar implementation for CLI operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tarsplitter::progress::ProgressReporter;

use crate::interrupt::InFlight;

/// Byte-based progress for splitting one archive.
///
/// Advances by the growth of the part files, which adds up to the source
/// size minus its end-of-archive blocks. Each part is registered with
/// `in_flight` as it is opened.
pub struct SplitProgress {
    bar: ProgressBar,
    in_flight: InFlight,
}

impl SplitProgress {
    /// Creates a bar over `total_bytes`, or a spinner when the size is unknown
    pub fn new(total_bytes: Option<u64>, quiet: bool, in_flight: &InFlight) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else if let Some(total) = total_bytes {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        };

        Self {
            bar,
            in_flight: in_flight.clone(),
        }
    }

    /// Finishes the progress bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SplitProgress {
    fn on_part_start(&self, index: usize, path: &Path) {
        self.in_flight.register(path);
        self.bar.set_message(format!("part {}", index));
    }

    fn on_entry(&self, _entry_name: &str, size: u64) {
        self.bar.inc(size);
    }

    fn on_warning(&self, message: &str) {
        self.bar.println(format!("Warning: {}", message));
    }
}

/// Entry-count progress shared by all archive workers
pub struct ArchiveProgress {
    bar: ProgressBar,
}

impl ArchiveProgress {
    /// Creates a new progress bar over `total` paths
    pub fn new(total: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        };

        Self { bar }
    }

    /// Sets the message
    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    /// Finishes the progress bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for ArchiveProgress {
    fn on_entry(&self, _entry_name: &str, _size: u64) {
        self.bar.inc(1);
    }

    fn on_warning(&self, message: &str) {
        // Skipped files still count toward the total
        self.bar.inc(1);
        self.bar.println(format!("Warning: {}", message));
    }
}
