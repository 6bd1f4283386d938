//! Building one fragment archive from one work unit.

use std::fs::{self, File, Metadata};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::config::{ArchiveOptions, ReadFailurePolicy};
use crate::error::IoResultExt;
use crate::format::ExactReader;
use crate::partition::WorkUnit;
use crate::progress::ProgressReporter;
use crate::sources::is_usable_path;
use crate::{Error, READ_BUFFER_SIZE, Result};

/// Outcome of one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentResult {
    /// Worker (and fragment) index.
    pub index: usize,
    /// Fragment file path.
    pub path: PathBuf,
    /// Entries written.
    pub entries: usize,
    /// Files left out under [`ReadFailurePolicy::Skip`].
    pub skipped: usize,
    /// Body bytes written.
    pub bytes: u64,
}

/// Returns the path of fragment `index` for `output`: `<output>.<NNN>`.
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use tarsplitter::archive::fragment_path;
///
/// assert_eq!(fragment_path(Path::new("all.tar"), 0), PathBuf::from("all.tar.000"));
/// assert_eq!(fragment_path(Path::new("all.tar"), 12), PathBuf::from("all.tar.012"));
/// ```
pub fn fragment_path(output: &Path, index: usize) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(format!(".{:03}", index));
    PathBuf::from(name)
}

/// Derives the entry name for `path`.
///
/// `strip_prefix` is removed when it matches; root and `.` components are
/// dropped so names are always relative.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for names containing `..` or reducing to
/// nothing.
pub fn entry_name(path: &Path, strip_prefix: Option<&Path>) -> Result<PathBuf> {
    let relative = strip_prefix
        .and_then(|prefix| path.strip_prefix(prefix).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path);

    let mut name = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => name.push(part),
            Component::ParentDir => {
                return Err(Error::InvalidInput(format!(
                    "{} escapes the archive root",
                    path.display()
                )));
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }

    if name.as_os_str().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} does not name an archive entry",
            path.display()
        )));
    }
    Ok(name)
}

/// A source opened and stat'ed, ready to be appended.
enum Source {
    File(File, Metadata),
    Directory(Metadata),
    Symlink(Metadata, PathBuf),
    /// FIFO or device node, archived as a header only and never opened.
    Special(Metadata),
}

/// Only regular files are opened; opening a FIFO would block until a writer
/// shows up.
fn open_source(path: &Path) -> io::Result<Source> {
    let metadata = fs::symlink_metadata(path)?;
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        let target = fs::read_link(path)?;
        Ok(Source::Symlink(metadata, target))
    } else if file_type.is_dir() {
        Ok(Source::Directory(metadata))
    } else if file_type.is_file() {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        Ok(Source::File(file, metadata))
    } else if is_special(&file_type) {
        Ok(Source::Special(metadata))
    } else {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sockets and unknown file types cannot be archived",
        ))
    }
}

#[cfg(unix)]
fn is_special(file_type: &fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo() || file_type.is_char_device() || file_type.is_block_device()
}

#[cfg(not(unix))]
fn is_special(_file_type: &fs::FileType) -> bool {
    false
}

/// Builds the fragment archive for `unit` at `fragment`.
///
/// Paths are written in unit order. An empty unit still produces a valid,
/// trailer-only archive.
pub fn build_fragment(
    unit: &WorkUnit<'_>,
    fragment: &Path,
    options: &ArchiveOptions,
    progress: &dyn ProgressReporter,
) -> Result<FragmentResult> {
    let file = File::create(fragment).context("creating fragment", fragment)?;
    let mut builder =
        tar::Builder::new(BufWriter::with_capacity(READ_BUFFER_SIZE * 8, file));

    let mut result = FragmentResult {
        index: unit.index,
        path: fragment.to_path_buf(),
        entries: 0,
        skipped: 0,
        bytes: 0,
    };

    for path in unit.paths {
        if !is_usable_path(path) {
            continue;
        }

        let source = match open_source(path) {
            Ok(source) => source,
            Err(e) => match options.read_failure {
                ReadFailurePolicy::Abort => return Err(Error::io("opening", path, e)),
                ReadFailurePolicy::Skip => {
                    let message = format!("skipping {}: {}", path.display(), e);
                    log::warn!("{}", message);
                    progress.on_warning(&message);
                    result.skipped += 1;
                    continue;
                }
            },
        };

        let name = entry_name(path, options.strip_prefix.as_deref())?;
        let size = append_source(&mut builder, source, path, &name, fragment)?;
        result.entries += 1;
        result.bytes += size;
        progress.on_entry(&name.to_string_lossy(), size);
    }

    let mut writer = builder
        .into_inner()
        .context("finishing fragment", fragment)?;
    writer.flush().context("writing fragment", fragment)?;

    log::debug!(
        "Fragment {} done: {} entries, {} skipped",
        result.index,
        result.entries,
        result.skipped
    );
    progress.on_fragment_complete(result.index, result.entries);
    Ok(result)
}

/// Appends one source and returns its body size.
fn append_source<W: Write>(
    builder: &mut tar::Builder<W>,
    source: Source,
    path: &Path,
    name: &Path,
    fragment: &Path,
) -> Result<u64> {
    let mut header = tar::Header::new_gnu();
    match source {
        Source::File(file, metadata) => {
            header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
            let size = metadata.len();
            let mut body = ExactReader::new(file, size);
            if let Err(e) = builder.append_data(&mut header, name, &mut body) {
                return Err(if body.failed() {
                    Error::io("reading", path, e)
                } else {
                    Error::io("writing fragment", fragment, e)
                });
            }
            Ok(size)
        }
        Source::Directory(metadata) | Source::Special(metadata) => {
            header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
            header.set_size(0);
            builder
                .append_data(&mut header, name, io::empty())
                .context("writing fragment", fragment)?;
            Ok(0)
        }
        Source::Symlink(metadata, target) => {
            header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
            header.set_size(0);
            builder
                .append_link(&mut header, name, &target)
                .context("writing fragment", fragment)?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{inspect_path, list_entries};
    use crate::partition::partition;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    #[test]
    fn test_entry_name_strips_prefix() {
        let name = entry_name(Path::new("/data/in/a/b.txt"), Some(Path::new("/data/in"))).unwrap();
        assert_eq!(name, PathBuf::from("a/b.txt"));
    }

    #[test]
    fn test_entry_name_drops_root_and_curdir() {
        assert_eq!(
            entry_name(Path::new("/abs/x.txt"), None).unwrap(),
            PathBuf::from("abs/x.txt")
        );
        assert_eq!(
            entry_name(Path::new("./rel/x.txt"), None).unwrap(),
            PathBuf::from("rel/x.txt")
        );
        // A non-matching prefix leaves the path alone
        assert_eq!(
            entry_name(Path::new("rel/x.txt"), Some(Path::new("/other"))).unwrap(),
            PathBuf::from("rel/x.txt")
        );
    }

    #[test]
    fn test_entry_name_rejects_parent_dir() {
        assert!(entry_name(Path::new("../etc/passwd"), None).is_err());
        assert!(entry_name(Path::new("/"), None).is_err());
    }

    #[test]
    fn test_build_fragment_in_order() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = ["c.txt", "a.txt", "b.txt"]
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                std::fs::write(&p, n.as_bytes()).unwrap();
                p
            })
            .collect();
        let units = partition(&paths, 1).unwrap();
        let options = ArchiveOptions::new().strip_prefix(dir.path());
        let fragment = dir.path().join("frag.000");

        let result = build_fragment(&units[0], &fragment, &options, &NoProgress).unwrap();
        assert_eq!(result.entries, 3);
        assert_eq!(result.bytes, 15);

        let names: Vec<String> = list_entries(&fragment)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_empty_unit_builds_trailer_only_archive() {
        let dir = TempDir::new().unwrap();
        let empty: Vec<PathBuf> = Vec::new();
        let units = partition(&empty, 2).unwrap();
        let fragment = dir.path().join("empty.001");
        let result =
            build_fragment(&units[1], &fragment, &ArchiveOptions::new(), &NoProgress).unwrap();

        assert_eq!(result.entries, 0);
        let layout = inspect_path(&fragment).unwrap();
        assert_eq!(layout.entries, 0);
        assert_eq!(layout.total_len, 1024);
        assert!(layout.has_single_trailer());
    }

    #[test]
    fn test_missing_file_aborts_by_default() {
        let dir = TempDir::new().unwrap();
        let paths = vec![dir.path().join("missing.txt")];
        let units = partition(&paths, 1).unwrap();
        let err = build_fragment(
            &units[0],
            &dir.path().join("f"),
            &ArchiveOptions::new(),
            &NoProgress,
        )
        .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn test_missing_file_skipped_when_configured() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("here.txt");
        std::fs::write(&present, b"ok").unwrap();
        let paths = vec![dir.path().join("missing.txt"), present, PathBuf::from("")];
        let units = partition(&paths, 1).unwrap();
        let options = ArchiveOptions::new()
            .read_failure(ReadFailurePolicy::Skip)
            .strip_prefix(dir.path());

        let result =
            build_fragment(&units[0], &dir.path().join("f"), &options, &NoProgress).unwrap();
        assert_eq!(result.entries, 1);
        assert_eq!(result.skipped, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_and_directory_entries() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("sub", &link).unwrap();

        let paths = vec![sub, link];
        let units = partition(&paths, 1).unwrap();
        let fragment = dir.path().join("f");
        let options = ArchiveOptions::new().strip_prefix(dir.path());
        build_fragment(&units[0], &fragment, &options, &NoProgress).unwrap();

        let entries = list_entries(&fragment).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_type, tar::EntryType::Directory);
        assert_eq!(entries[1].entry_type, tar::EntryType::Symlink);
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_archived_without_opening() {
        let dir = TempDir::new().unwrap();
        let fifo = dir.path().join("pipe");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());
        let regular = dir.path().join("after.txt");
        std::fs::write(&regular, b"still here").unwrap();

        let paths = vec![fifo, regular];
        let units = partition(&paths, 1).unwrap();
        let fragment = dir.path().join("f");
        let options = ArchiveOptions::new().strip_prefix(dir.path());
        let result = build_fragment(&units[0], &fragment, &options, &NoProgress).unwrap();

        assert_eq!(result.entries, 2);
        assert_eq!(result.bytes, 10);
        let entries = list_entries(&fragment).unwrap();
        assert_eq!(entries[0].name, "pipe");
        assert_eq!(entries[0].entry_type, tar::EntryType::Fifo);
        assert_eq!(entries[0].size, 0);
        assert_eq!(entries[1].name, "after.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_device_node_is_header_only() {
        let dir = TempDir::new().unwrap();
        let paths = vec![PathBuf::from("/dev/null")];
        let units = partition(&paths, 1).unwrap();
        let fragment = dir.path().join("f");
        build_fragment(&units[0], &fragment, &ArchiveOptions::new(), &NoProgress).unwrap();

        let entries = list_entries(&fragment).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dev/null");
        assert_eq!(entries[0].entry_type, tar::EntryType::Char);
        assert_eq!(entries[0].size, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_follows_read_failure_policy() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("sock");
        let _listener = std::os::unix::net::UnixListener::bind(&socket).unwrap();
        let paths = vec![socket];
        let units = partition(&paths, 1).unwrap();

        let err = build_fragment(
            &units[0],
            &dir.path().join("f0"),
            &ArchiveOptions::new(),
            &NoProgress,
        )
        .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::Unsupported));

        let options = ArchiveOptions::new().read_failure(ReadFailurePolicy::Skip);
        let result =
            build_fragment(&units[0], &dir.path().join("f1"), &options, &NoProgress).unwrap();
        assert_eq!(result.entries, 0);
        assert_eq!(result.skipped, 1);
    }
}
