use crate::outcome::FrameState;

/// Fatal errors of the frame reader. Any of these ends the read loop.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A read timed out before the requested bytes arrived.
    #[error("short read while {state} ({received} of {expected} bytes)")]
    ShortRead {
        state: FrameState,
        expected: usize,
        received: usize,
    },

    /// The payload exceeds what a single length byte can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing the channel.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
