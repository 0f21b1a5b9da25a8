use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;

use tracing::info;

use crate::closer::ChannelCloser;
use crate::error::{Result, TransportError};

/// Channel that replays a captured byte stream.
///
/// Reads come from the capture; writes (the acknowledgment bytes of the
/// handshake) are counted and dropped. End of capture reads as EOF.
pub struct ReplayChannel<R> {
    inner: R,
    written: Vec<u8>,
    closer: ChannelCloser,
}

impl<R: Read> ReplayChannel<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            written: Vec::new(),
            closer: ChannelCloser::new(),
        }
    }

    /// Bytes written to the channel so far, in order.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Handle that closes this channel from another thread.
    pub fn closer(&self) -> ChannelCloser {
        self.closer.clone()
    }

    /// Consume the channel and return the capture source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ReplayChannel<Cursor<Vec<u8>>> {
    /// Replay an in-memory capture.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }
}

impl ReplayChannel<BufReader<File>> {
    /// Replay a capture file recorded from the link.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TransportError::Capture {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "replaying capture");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> Read for ReplayChannel<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.closer.check()?;
        self.inner.read(buf)
    }
}

impl<R> Write for ReplayChannel<R> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.closer.check()?;
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.closer.check()
    }
}

impl<R> std::fmt::Debug for ReplayChannel<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayChannel")
            .field("written", &self.written.len())
            .field("closed", &self.closer.is_closed())
            .finish()
    }
}
