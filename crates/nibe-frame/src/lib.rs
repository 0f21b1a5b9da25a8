//! Frame reader for the NIBE heat-pump RS-485 link.
//!
//! The controller pushes frames and waits for an acknowledgment byte at two
//! points of every exchange. On the wire a frame looks like:
//! - A 1-byte sentinel (`0x03`) followed by a fixed 2-byte header (`0x00 0x14`)
//! - ACK (`0x06`) from the reader
//! - A 4-byte prefix whose last byte is the payload length `L`
//! - `L` payload bytes and one XOR checksum over prefix and payload
//! - ACK from the reader
//!
//! Noise is absorbed by re-aligning on the sentinel one byte at a time.

pub mod codec;
pub mod error;
pub mod outcome;
pub mod reader;

pub use codec::{
    checksum, decode_frame, encode_frame, encode_wire, Frame, FrameConfig, ACK, DATA_ADDRESS,
    DEFAULT_READ_TIMEOUT, HEADER, MAX_PAYLOAD, PREFIX_LEN, SENTINEL,
};
pub use error::{FrameError, Result};
pub use outcome::{FrameOutcome, FrameState, FrameStats, RejectReason};
pub use reader::FrameReader;
