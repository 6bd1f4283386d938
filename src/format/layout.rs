//! Block-level inspection of tar archives.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::{BLOCK_SIZE, TRAILER_SIZE, is_extension_header, padded_size};
use crate::error::IoResultExt;
use crate::{Error, Result};

/// Block structure of a tar archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Number of entries, not counting extension headers.
    pub entries: usize,
    /// Number of GNU long-name and PAX headers.
    pub extension_headers: usize,
    /// Offset just past the last entry body.
    pub data_end: u64,
    /// Zero-block runs followed by more entries. A tar reader stops at the
    /// first of these, so a well-formed archive has none.
    pub embedded_trailers: usize,
    /// Length of the zero run at the end of the archive.
    pub trailing_zero_bytes: u64,
    /// Total archive length.
    pub total_len: u64,
}

impl ArchiveLayout {
    /// Returns true if the archive ends with at least one full trailer.
    pub fn is_terminated(&self) -> bool {
        self.trailing_zero_bytes >= TRAILER_SIZE
    }

    /// Returns true if the archive has exactly one trailer, at the very end.
    pub fn has_single_trailer(&self) -> bool {
        self.embedded_trailers == 0 && self.trailing_zero_bytes == TRAILER_SIZE
    }
}

/// One entry as seen by a tar reader (long names resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Entry path inside the archive.
    pub name: String,
    /// Body size in bytes.
    pub size: u64,
    /// Header type flag.
    pub entry_type: tar::EntryType,
}

enum BlockRead {
    Full,
    Partial(usize),
    Eof,
}

fn read_block<R: Read>(reader: &mut R, block: &mut [u8]) -> io::Result<BlockRead> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(match filled {
        0 => BlockRead::Eof,
        n if n == block.len() => BlockRead::Full,
        n => BlockRead::Partial(n),
    })
}

fn corrupt(path: &Path, entry_index: usize, reason: impl Into<String>) -> Error {
    Error::CorruptArchive {
        path: path.to_path_buf(),
        entry_index,
        reason: reason.into(),
    }
}

/// Walks the header chain of a tar stream without interpreting entry bodies.
///
/// `path` is only used in error messages.
pub fn inspect_layout<R: Read>(mut reader: R, path: &Path) -> Result<ArchiveLayout> {
    let mut layout = ArchiveLayout::default();
    let mut block = [0u8; BLOCK_SIZE as usize];
    let mut offset = 0u64;
    let mut zero_run = 0u64;

    loop {
        let index = layout.entries + layout.extension_headers;
        match read_block(&mut reader, &mut block).context("reading", path)? {
            BlockRead::Eof => break,
            BlockRead::Partial(n) => {
                return Err(corrupt(
                    path,
                    index,
                    format!("truncated block of {} bytes at offset {}", n, offset),
                ));
            }
            BlockRead::Full => {}
        }
        offset += BLOCK_SIZE;

        if block.iter().all(|&b| b == 0) {
            zero_run += BLOCK_SIZE;
            continue;
        }
        if zero_run > 0 {
            layout.embedded_trailers += 1;
            zero_run = 0;
        }

        let header = tar::Header::from_byte_slice(&block);
        let size = header
            .entry_size()
            .map_err(|e| corrupt(path, index, e.to_string()))?;
        let body = padded_size(size);
        let skipped = io::copy(&mut reader.by_ref().take(body), &mut io::sink())
            .context("reading", path)?;
        if skipped != body {
            return Err(corrupt(
                path,
                index,
                format!("entry body truncated: expected {} bytes, found {}", body, skipped),
            ));
        }
        offset += body;
        layout.data_end = offset;

        if is_extension_header(header.entry_type()) {
            layout.extension_headers += 1;
        } else {
            layout.entries += 1;
        }
    }

    layout.trailing_zero_bytes = zero_run;
    layout.total_len = offset;
    Ok(layout)
}

/// Inspects the archive at `path`. See [`inspect_layout`].
pub fn inspect_path(path: impl AsRef<Path>) -> Result<ArchiveLayout> {
    let path = path.as_ref();
    let file = File::open(path).context("opening", path)?;
    inspect_layout(BufReader::new(file), path)
}

/// Lists the entries of the archive at `path` in stream order.
pub fn list_entries(path: impl AsRef<Path>) -> Result<Vec<EntrySummary>> {
    let path = path.as_ref();
    let file = File::open(path).context("opening", path)?;
    let mut archive = tar::Archive::new(BufReader::new(file));
    let mut summaries = Vec::new();

    for (index, entry) in archive
        .entries()
        .context("reading", path)?
        .enumerate()
    {
        let entry = entry.map_err(|e| corrupt(path, index, e.to_string()))?;
        summaries.push(EntrySummary {
            name: String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
            size: entry.size(),
            entry_type: entry.header().entry_type(),
        });
    }

    Ok(summaries)
}
