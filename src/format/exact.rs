//! Fixed-length body reader.

use std::io::{self, Read};

/// Yields exactly `remaining` bytes from the inner reader, failing on a short
/// read instead of ending early.
///
/// A tar header announces the body size up front, so a body that comes up
/// short (truncated source, file shrunk while being archived) must be an error
/// rather than a silently shorter entry. [`failed`](Self::failed) tells read
/// errors apart from write errors after a copy fails.
pub(crate) struct ExactReader<R> {
    inner: R,
    remaining: u64,
    failed: bool,
}

impl<R: Read> ExactReader<R> {
    pub(crate) fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            failed: false,
        }
    }

    /// Returns true if the inner reader failed or ended early.
    pub(crate) fn failed(&self) -> bool {
        self.failed
    }
}

impl<R: Read> Read for ExactReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf
            .len()
            .min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        match self.inner.read(&mut buf[..max]) {
            Ok(0) => {
                self.failed = true;
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("entry body truncated, {} bytes missing", self.remaining),
                ))
            }
            Ok(n) => {
                self.remaining -= n as u64;
                Ok(n)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.failed = true;
                }
                Err(e)
            }
        }
    }
}
