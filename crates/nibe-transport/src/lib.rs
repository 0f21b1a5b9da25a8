//! Byte channel for the NIBE heat-pump RS-485 link.
//!
//! The controller talks 19200 baud, 8 data bits, one stop bit and mark
//! parity. This is the lowest layer of the stack; the frame reader owns a
//! channel exclusively and everything else builds on the bytes it yields.
//!
//! - [`SerialChannel`] opens a tty and configures mark parity (Linux)
//! - [`ReplayChannel`] replays a captured byte stream and swallows writes
//! - [`ChannelCloser`] lets another thread close a channel that is in use

pub mod closer;
pub mod error;
pub mod replay;

#[cfg(unix)]
pub mod serial;

pub use closer::ChannelCloser;
pub use error::{Result, TransportError};
pub use replay::ReplayChannel;

#[cfg(unix)]
pub use serial::{LinkParity, SerialChannel, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
