use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared close flag for a channel.
///
/// Once closed, every read and write on the owning channel fails with
/// [`io::ErrorKind::NotConnected`]. Serial reads poll the flag between
/// short device reads, so a blocked read fails within one poll interval.
#[derive(Debug, Clone, Default)]
pub struct ChannelCloser {
    closed: Arc<AtomicBool>,
}

impl ChannelCloser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the channel closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> io::Result<()> {
        if self.is_closed() {
            Err(io::Error::new(io::ErrorKind::NotConnected, "channel closed"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let closer = ChannelCloser::new();
        let other = closer.clone();
        assert!(closer.check().is_ok());

        other.close();

        assert!(closer.is_closed());
        let err = closer.check().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
