use std::fmt;
use std::io;

use nibe_frame::FrameError;
use nibe_link::LinkError;
use nibe_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// I/O failure on an open line.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Unsupported(_) => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ShortRead { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use nibe_frame::FrameState;

    use super::*;

    #[test]
    fn short_read_maps_to_timeout() {
        let err = frame_error(
            "link failed",
            FrameError::ShortRead {
                state: FrameState::AwaitingPayload,
                expected: 20,
                received: 4,
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("link failed: "));
    }

    #[test]
    fn oversized_payload_is_invalid_data() {
        let err = link_error(
            "link failed",
            LinkError::Frame(FrameError::PayloadTooLarge { size: 300, max: 255 }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unsupported_platform_is_usage() {
        let err = transport_error(
            "open failed",
            TransportError::Unsupported("mark parity".to_string()),
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn io_errors_by_kind() {
        let timed_out = io_error("read", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(timed_out.code, TIMEOUT);
        let closed = io_error("read", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(closed.code, FAILURE);
        let other = io_error("read", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(other.code, TRANSPORT_ERROR);
    }
}
