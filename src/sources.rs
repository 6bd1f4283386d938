//! Acquiring the list of paths to archive.
//!
//! Paths come either from a recursive directory walk or from a
//! newline-delimited list file. A walked list can be persisted next to the
//! output archive so the run can be reproduced or audited.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Result;
use crate::error::IoResultExt;

/// Returns false for list lines that cannot name a file: empty strings and a
/// bare directory separator.
pub fn is_usable_path(path: &Path) -> bool {
    let s = path.as_os_str();
    !s.is_empty() && s != "/" && s != std::path::MAIN_SEPARATOR_STR
}

/// Walks `root` recursively and returns every non-directory path, sorted by
/// file name within each directory.
///
/// Symbolic links are listed, not followed.
pub fn collect_from_dir(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            crate::Error::io("walking", path, io::Error::from(e))
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        paths.push(entry.into_path());
    }

    log::info!("Found {} files under {}", paths.len(), root.display());
    Ok(paths)
}

/// Reads a newline-delimited path list, dropping unusable lines.
pub fn read_path_list(list: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let list = list.as_ref();
    let file = File::open(list).context("opening", list)?;
    let mut paths = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line.context("reading", list)?;
        let line = line.trim_end_matches('\r');
        let path = PathBuf::from(line);
        if is_usable_path(&path) {
            paths.push(path);
        } else {
            log::debug!("Ignoring list line {:?}", line);
        }
    }

    Ok(paths)
}

/// Writes `paths` one per line to `dest`.
pub fn write_path_list(paths: &[PathBuf], dest: impl AsRef<Path>) -> Result<()> {
    let dest = dest.as_ref();
    let file = File::create(dest).context("creating", dest)?;
    let mut out = BufWriter::new(file);
    for path in paths {
        writeln!(out, "{}", path.to_string_lossy()).context("writing", dest)?;
    }
    out.flush().context("writing", dest)?;
    Ok(())
}

/// Path of the list persisted next to `output`: `<output>.txt`.
pub fn path_list_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".txt");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_usable_path_filter() {
        assert!(!is_usable_path(Path::new("")));
        assert!(!is_usable_path(Path::new("/")));
        assert!(is_usable_path(Path::new("a.txt")));
        assert!(is_usable_path(Path::new("/abs/a.txt")));
    }

    #[test]
    fn test_collect_from_dir_skips_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/deeper/c.txt"), b"c").unwrap();

        let paths = collect_from_dir(dir.path()).unwrap();
        let rel: Vec<PathBuf> = paths
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn test_collect_from_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_from_dir(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_list_round_trip_filters_junk() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("list.txt");
        std::fs::write(&list, "a.txt\n\n/\nsub/b.txt\r\n").unwrap();

        let paths = read_path_list(&list).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.txt")]);

        let copy = dir.path().join("copy.txt");
        write_path_list(&paths, &copy).unwrap();
        assert_eq!(read_path_list(&copy).unwrap(), paths);
    }

    #[test]
    fn test_path_list_path() {
        assert_eq!(
            path_list_path(Path::new("/out/all.tar")),
            PathBuf::from("/out/all.tar.txt")
        );
    }
}
