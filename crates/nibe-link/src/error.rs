use nibe_frame::FrameError;

/// Errors that end a link session.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The channel could not be opened or configured.
    #[error("transport error: {0}")]
    Transport(#[from] nibe_transport::TransportError),

    /// The frame reader hit a fatal channel error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl LinkError {
    /// True when the channel simply ran out of bytes (end of a capture).
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, LinkError::Frame(FrameError::ConnectionClosed))
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
