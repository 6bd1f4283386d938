//! Round-trip integration tests.
//!
//! A directory is archived in parallel, the merged archive is split again,
//! and the parts are checked against the original file list.

mod common;

use std::collections::BTreeSet;
use std::fs;

use tarsplitter::archive::create_from_dir;
use tarsplitter::config::{ArchiveOptions, SplitOptions, Threshold};
use tarsplitter::progress::NoProgress;
use tarsplitter::sources::{path_list_path, read_path_list};
use tarsplitter::split::{split_path, split_reader};
use tempfile::TempDir;

#[test]
fn test_archive_then_split_preserves_entry_set() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("corpus");
    fs::create_dir_all(src.join("sub")).unwrap();
    common::write_files(&src, 20, 4000);
    common::write_files(&src.join("sub"), 5, 700);
    let merged = dir.path().join("corpus.tar");

    let options = ArchiveOptions::new().workers(4).unwrap().strip_prefix(&src);
    let archived = create_from_dir(&src, &merged, &options, &NoProgress).unwrap();
    assert_eq!(archived.entries(), 25);

    let split_options = SplitOptions::new().threshold(Threshold::PartCount(3));
    let result = split_path(&merged, dir.path().join("corpus-"), &split_options, &NoProgress)
        .unwrap();
    assert!(result.parts.len() >= 3);

    let from_parts: BTreeSet<String> = result
        .parts
        .iter()
        .flat_map(|p| common::entry_names(&p.path))
        .collect();
    let from_list: BTreeSet<String> = read_path_list(path_list_path(&merged))
        .unwrap()
        .iter()
        .map(|p| p.strip_prefix(&src).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(from_parts, from_list);
}

#[test]
fn test_split_parts_concatenate_back_to_source_entries() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.tar");
    let entries = common::uniform_entries(30, 1234);
    common::write_archive(&source, &entries);

    let result = split_path(
        &source,
        dir.path().join("piece"),
        &SplitOptions::new().threshold(Threshold::PartSize(8 * 1024)),
        &NoProgress,
    )
    .unwrap();

    // Merging the parts again must yield the original entries in order
    let merged = dir.path().join("rejoined.tar");
    tarsplitter::merge(&result.part_paths(), &merged).unwrap();
    assert_eq!(common::read_archive(&merged), entries);
    assert!(result.parts.iter().all(|p| !p.path.exists()));
}

#[test]
fn test_split_from_reader_with_unknown_size() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.tar");
    let entries = common::uniform_entries(10, 600);
    common::write_archive(&source, &entries);
    let bytes = fs::read(&source).unwrap();

    let result = split_reader(
        bytes.as_slice(),
        std::path::Path::new("-"),
        &dir.path().join("stream"),
        3072,
        &NoProgress,
    )
    .unwrap();

    let total: usize = result.parts.iter().map(|p| p.entries).sum();
    assert_eq!(total, 10);
    assert_eq!(result.parts.len(), 5);
}
