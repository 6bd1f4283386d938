//! Files to remove when the process is interrupted.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Paths written by the running command that are not yet final.
///
/// Cloned into the Ctrl-C handler; the command registers paths before it
/// starts writing them and clears the list once the run has finished.
#[derive(Clone, Default)]
pub struct InFlight {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a path to remove on interrupt.
    pub fn register(&self, path: impl Into<PathBuf>) {
        self.lock().push(path.into());
    }

    /// Forgets all registered paths.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes every registered file and returns how many existed.
    pub fn remove_all(&self) -> usize {
        let mut paths = self.lock();
        let mut removed = 0;
        for path in paths.drain(..) {
            if fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_all_deletes_registered_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("out.tar.000");
        let b = dir.path().join("out.tar");
        fs::write(&a, b"fragment").unwrap();
        fs::write(&b, b"partial").unwrap();

        let in_flight = InFlight::new();
        in_flight.register(&a);
        in_flight.register(&b);
        in_flight.register(dir.path().join("never-created.tar.001"));

        assert_eq!(in_flight.clone().remove_all(), 2);
        assert!(!a.exists());
        assert!(!b.exists());
        assert_eq!(in_flight.remove_all(), 0);
    }

    #[test]
    fn test_cleared_paths_survive() {
        let dir = TempDir::new().unwrap();
        let done = dir.path().join("done.tar");
        fs::write(&done, b"final").unwrap();

        let in_flight = InFlight::new();
        in_flight.register(&done);
        in_flight.clear();

        assert_eq!(in_flight.remove_all(), 0);
        assert!(done.exists());
    }
}
