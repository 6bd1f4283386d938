//! Shared test utilities for integration tests.
//!
//! Fixture archives are built with `tar::Builder` and written into a
//! `TempDir`; file bodies come from a fixed-seed RNG so runs are reproducible.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tarsplitter::format::list_entries;

/// Deterministic pseudo-random bytes.
///
/// The same `seed` always yields the same data.
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

/// Writes a GNU tar archive holding `entries` (name, body) to `path`.
pub fn write_archive(path: &Path, entries: &[(String, Vec<u8>)]) {
    let file = File::create(path).expect("Failed to create archive");
    let mut builder = tar::Builder::new(file);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        builder
            .append_data(&mut header, name, data.as_slice())
            .expect("Failed to append entry");
    }
    builder.finish().expect("Failed to finish archive");
}

/// Builds `count` entries named `file_NNNN.bin`, each `size` random bytes.
pub fn uniform_entries(count: usize, size: usize) -> Vec<(String, Vec<u8>)> {
    (0..count)
        .map(|i| (format!("file_{:04}.bin", i), random_bytes(i as u64, size)))
        .collect()
}

/// Writes `count` files of `size` random bytes under `dir` and returns their
/// paths in creation order.
pub fn write_files(dir: &Path, count: usize, size: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("file_{:04}.bin", i));
            std::fs::write(&path, random_bytes(1000 + i as u64, size))
                .expect("Failed to write file");
            path
        })
        .collect()
}

/// Reads every entry of the archive at `path` as (name, body).
pub fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).expect("Failed to open archive");
    let mut archive = tar::Archive::new(file);
    archive
        .entries()
        .expect("Failed to read entries")
        .map(|entry| {
            let mut entry = entry.expect("Failed to read entry");
            let name = entry
                .path()
                .expect("Entry without a path")
                .to_string_lossy()
                .into_owned();
            let mut data = Vec::new();
            std::io::Read::read_to_end(&mut entry, &mut data).expect("Failed to read body");
            (name, data)
        })
        .collect()
}

/// Entry names of the archive at `path`, in archive order.
pub fn entry_names(path: &Path) -> Vec<String> {
    list_entries(path)
        .expect("Failed to list entries")
        .into_iter()
        .map(|e| e.name)
        .collect()
}
