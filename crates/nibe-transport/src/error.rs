use std::path::PathBuf;

/// Errors that can occur while opening or configuring a channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// The serial device opened but line settings could not be applied.
    #[error("failed to configure serial port {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A capture file could not be opened for replay.
    #[error("failed to open capture {path}: {source}")]
    Capture {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested line setting is not available on this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An I/O error occurred on the channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
