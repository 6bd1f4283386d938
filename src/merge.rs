//! Concatenating fragment archives into one archive.
//!
//! Each fragment is a complete tar archive ending in a [`TRAILER_SIZE`] zero
//! trailer. Fragments are appended in index order with the trailer cut off
//! every fragment except the last, so the result holds all entries and ends
//! with exactly one trailer.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::IoResultExt;
use crate::format::TRAILER_SIZE;
use crate::{Error, Result};

/// Merges `fragments` (in index order) into `output` and deletes each
/// fragment once it has been copied.
///
/// Every fragment is checked for its trailer before `output` is touched.
/// `output` is created or truncated, and removed again if the merge fails
/// part way. Returns the number of bytes written.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `fragments` is empty
/// - [`Error::InvalidFragment`] if a fragment does not end in a trailer
/// - [`Error::Io`] on any read, write or delete failure
pub fn merge(fragments: &[PathBuf], output: impl AsRef<Path>) -> Result<u64> {
    let output = output.as_ref();
    if fragments.is_empty() {
        return Err(Error::InvalidInput("no fragments to merge".into()));
    }

    for fragment in fragments {
        open_fragment(fragment)?;
    }

    let file = File::create(output).context("creating", output)?;
    match concatenate(fragments, file, output) {
        Ok(written) => {
            log::info!(
                "Merged {} fragments into {} ({} bytes)",
                fragments.len(),
                output.display(),
                written
            );
            Ok(written)
        }
        Err(e) => {
            remove_partial(output);
            Err(e)
        }
    }
}

/// Opens a fragment, checks its trailer and returns it rewound with its length.
fn open_fragment(fragment: &Path) -> Result<(File, u64)> {
    let mut source = File::open(fragment).context("opening fragment", fragment)?;
    let len = source
        .metadata()
        .context("statting fragment", fragment)?
        .len();
    check_trailer(&mut source, fragment, len)?;
    Ok((source, len))
}

fn concatenate(fragments: &[PathBuf], file: File, output: &Path) -> Result<u64> {
    let last = fragments.len() - 1;
    let mut out = BufWriter::new(file);
    let mut written = 0u64;

    for (index, fragment) in fragments.iter().enumerate() {
        let (source, len) = open_fragment(fragment)?;
        let keep = if index == last { len } else { len - TRAILER_SIZE };
        let copied = io::copy(&mut source.take(keep), &mut out)
            .context("merging fragment", fragment)?;
        if copied != keep {
            return Err(Error::InvalidFragment {
                path: fragment.clone(),
                reason: format!("expected {} bytes, read {}", keep, copied),
            });
        }
        out.flush().context("writing", output)?;
        written += copied;

        fs::remove_file(fragment).context("removing fragment", fragment)?;
        log::debug!(
            "Merged fragment {} ({} of {} bytes)",
            fragment.display(),
            keep,
            len
        );
    }

    out.into_inner()
        .map_err(|e| Error::io("writing", output, e.into_error()))?
        .sync_all()
        .context("syncing", output)?;
    Ok(written)
}

/// Removes a half-written output file.
fn remove_partial(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => log::debug!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(
            "Could not remove partial output {}: {}",
            output.display(),
            e
        ),
    }
}

/// Verifies that the last [`TRAILER_SIZE`] bytes are zero and rewinds.
fn check_trailer(source: &mut File, path: &Path, len: u64) -> Result<()> {
    if len < TRAILER_SIZE {
        return Err(Error::InvalidFragment {
            path: path.to_path_buf(),
            reason: format!("{} bytes is shorter than the end-of-archive trailer", len),
        });
    }

    let mut trailer = [0u8; TRAILER_SIZE as usize];
    source
        .seek(SeekFrom::Start(len - TRAILER_SIZE))
        .context("seeking fragment", path)?;
    source
        .read_exact(&mut trailer)
        .context("reading fragment", path)?;
    if trailer.iter().any(|&b| b != 0) {
        return Err(Error::InvalidFragment {
            path: path.to_path_buf(),
            reason: "missing end-of-archive trailer".into(),
        });
    }

    source
        .seek(SeekFrom::Start(0))
        .context("seeking fragment", path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{inspect_path, list_entries};
    use tempfile::TempDir;

    fn fragment(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        let mut builder = tar::Builder::new(File::create(&path).unwrap());
        for (entry, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, entry, *data).unwrap();
        }
        builder.finish().unwrap();
        path
    }

    #[test]
    fn test_merge_keeps_single_trailer() {
        let dir = TempDir::new().unwrap();
        let frags = vec![
            fragment(dir.path(), "f0", &[("a", b"1"), ("b", b"22")]),
            fragment(dir.path(), "f1", &[("c", b"333")]),
            fragment(dir.path(), "f2", &[("d", b"4444")]),
        ];
        let out = dir.path().join("all.tar");

        let written = merge(&frags, &out).unwrap();
        assert_eq!(written, std::fs::metadata(&out).unwrap().len());

        let layout = inspect_path(&out).unwrap();
        assert_eq!(layout.entries, 4);
        assert!(layout.has_single_trailer());

        let names: Vec<String> = list_entries(&out).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(frags.iter().all(|f| !f.exists()));
    }

    #[test]
    fn test_merge_with_empty_fragments() {
        let dir = TempDir::new().unwrap();
        let frags = vec![
            fragment(dir.path(), "f0", &[("a", b"x")]),
            fragment(dir.path(), "f1", &[]),
            fragment(dir.path(), "f2", &[]),
        ];
        let out = dir.path().join("all.tar");
        merge(&frags, &out).unwrap();

        let layout = inspect_path(&out).unwrap();
        assert_eq!(layout.entries, 1);
        assert!(layout.has_single_trailer());
    }

    #[test]
    fn test_merge_all_empty_is_valid_archive() {
        let dir = TempDir::new().unwrap();
        let frags = vec![fragment(dir.path(), "f0", &[]), fragment(dir.path(), "f1", &[])];
        let out = dir.path().join("all.tar");
        assert_eq!(merge(&frags, &out).unwrap(), TRAILER_SIZE);
        assert!(list_entries(&out).unwrap().is_empty());
    }

    #[test]
    fn test_merge_rejects_unterminated_fragment() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad");
        std::fs::write(&bad, vec![1u8; 2048]).unwrap();
        let err = merge(&[bad], dir.path().join("out.tar")).unwrap_err();
        assert!(matches!(err, Error::InvalidFragment { .. }));
    }

    #[test]
    fn test_merge_rejects_short_fragment() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("short");
        std::fs::write(&bad, vec![0u8; 100]).unwrap();
        assert!(merge(&[bad], dir.path().join("out.tar")).is_err());
    }

    #[test]
    fn test_bad_fragment_leaves_no_output_and_keeps_good_ones() {
        let dir = TempDir::new().unwrap();
        let good = fragment(dir.path(), "f0", &[("a", b"alpha")]);
        let bad = dir.path().join("f1");
        std::fs::write(&bad, vec![7u8; 2048]).unwrap();
        let out = dir.path().join("all.tar");

        let err = merge(&[good.clone(), bad.clone()], &out).unwrap_err();
        assert!(matches!(err, Error::InvalidFragment { ref path, .. } if path == &bad));
        assert!(!out.exists());
        assert!(good.exists());
        assert_eq!(list_entries(&good).unwrap().len(), 1);
    }

    #[test]
    fn test_bad_fragment_does_not_clobber_existing_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("all.tar");
        std::fs::write(&out, b"previous").unwrap();
        let bad = dir.path().join("f0");
        std::fs::write(&bad, vec![0u8; 10]).unwrap();

        assert!(merge(&[bad], &out).is_err());
        assert_eq!(std::fs::read(&out).unwrap(), b"previous");
    }

    #[test]
    fn test_merge_requires_fragments() {
        let dir = TempDir::new().unwrap();
        assert!(merge(&[], dir.path().join("out.tar")).unwrap_err().is_input_error());
    }
}
