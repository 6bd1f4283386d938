//! Destination part files for the splitter.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::IoResultExt;
use crate::format::ExactReader;
use crate::{Error, Result};

/// A finished part archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePart {
    /// Part number, starting at 0.
    pub index: usize,
    /// Absolute path of the part file.
    pub path: PathBuf,
    /// Number of entries written to the part.
    pub entries: usize,
    /// Sum of observed on-disk growth per entry (headers, bodies and block
    /// padding; the trailer is not included).
    pub bytes: u64,
}

/// Returns the path of part `index`: `<prefix><index>.tar`.
///
/// # Example
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use tarsplitter::split::part_path;
///
/// assert_eq!(part_path(Path::new("out/part-"), 0), PathBuf::from("out/part-0.tar"));
/// assert_eq!(part_path(Path::new("data"), 12), PathBuf::from("data12.tar"));
/// ```
pub fn part_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("{}.tar", index));
    PathBuf::from(name)
}

/// An open part being written.
pub(crate) struct PartWriter {
    index: usize,
    path: PathBuf,
    builder: tar::Builder<BufWriter<File>>,
    entries: usize,
    bytes: u64,
    observed: u64,
}

impl PartWriter {
    pub(crate) fn create(prefix: &Path, index: usize) -> Result<Self> {
        let path = part_path(prefix, index);
        let file = File::create(&path).context("creating part", &path)?;
        log::info!("Initialized archive part {}", path.display());

        Ok(Self {
            index,
            path,
            builder: tar::Builder::new(BufWriter::new(file)),
            entries: 0,
            bytes: 0,
            observed: 0,
        })
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// On-disk size observed after the last write.
    pub(crate) fn observed_size(&self) -> u64 {
        self.observed
    }

    /// Flushes buffered data and stats the file.
    fn size_on_disk(&mut self) -> Result<u64> {
        self.builder
            .get_mut()
            .flush()
            .context("flushing part", &self.path)?;
        let metadata = self
            .builder
            .get_ref()
            .get_ref()
            .metadata()
            .context("statting part", &self.path)?;
        Ok(metadata.len())
    }

    /// Writes an extension header whose body is already in memory.
    pub(crate) fn append_extension(&mut self, header: &tar::Header, data: &[u8]) -> Result<()> {
        self.builder
            .append(header, data)
            .context("writing part", &self.path)
    }

    /// Writes one entry, reading exactly `header.entry_size()` bytes of body.
    ///
    /// Short or failing reads from `body` are reported as corruption of
    /// `source`; everything else as a write failure on the part.
    pub(crate) fn append_entry<R: Read>(
        &mut self,
        header: &tar::Header,
        size: u64,
        body: R,
        source: &Path,
        entry_index: usize,
    ) -> Result<()> {
        let mut body = ExactReader::new(body, size);
        if let Err(e) = self.builder.append(header, &mut body) {
            return Err(if body.failed() {
                Error::CorruptArchive {
                    path: source.to_path_buf(),
                    entry_index,
                    reason: e.to_string(),
                }
            } else {
                Error::io("writing part", &self.path, e)
            });
        }
        Ok(())
    }

    /// Records a completed entry group and returns the observed growth.
    pub(crate) fn commit_entry(&mut self, before: u64) -> Result<u64> {
        let after = self.size_on_disk()?;
        let delta = after.saturating_sub(before);
        self.entries += 1;
        self.bytes += delta;
        self.observed = after;
        Ok(delta)
    }

    /// Writes the trailer and closes the file.
    pub(crate) fn finish(self) -> Result<ArchivePart> {
        let Self {
            index,
            path,
            builder,
            entries,
            bytes,
            ..
        } = self;

        let writer = builder.into_inner().context("finishing part", &path)?;
        writer
            .into_inner()
            .map_err(|e| Error::io("flushing part", &path, e.into_error()))?;

        Ok(ArchivePart {
            index,
            path,
            entries,
            bytes,
        })
    }
}
