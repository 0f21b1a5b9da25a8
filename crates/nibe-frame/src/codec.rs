use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::outcome::RejectReason;

/// Start-of-frame sentinel.
pub const SENTINEL: u8 = 0x03;

/// Device/function identifier that must follow the sentinel.
pub const HEADER: [u8; 2] = [0x00, 0x14];

/// Acknowledgment byte written by the reader.
pub const ACK: u8 = 0x06;

/// Prefix before the payload: 3 address bytes + 1 length byte.
pub const PREFIX_LEN: usize = 4;

/// Largest payload a length byte can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Address bytes of the periodic register-data frame (`C0 00 59`).
pub const DATA_ADDRESS: [u8; 3] = [0xC0, 0x00, 0x59];

/// Default read timeout applied to serial channels.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// A frame that passed checksum validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The 4-byte prefix (address + length).
    pub prefix: [u8; PREFIX_LEN],
    /// Register data between the prefix and the checksum.
    pub payload: Bytes,
    /// Trailing checksum byte.
    pub checksum: u8,
}

impl Frame {
    /// Payload length as announced by the prefix.
    pub fn length(&self) -> u8 {
        self.prefix[PREFIX_LEN - 1]
    }

    /// Bytes received after the first acknowledgment.
    pub fn wire_size(&self) -> usize {
        PREFIX_LEN + self.payload.len() + 1
    }
}

/// XOR of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Encode the frame body sent after the first acknowledgment.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────┬──────────────┬──────────┐
/// │ Address (3B) │ Length │ Payload      │ Checksum │
/// │ C0 00 59     │ (1B)   │ (Length B)   │ XOR (1B) │
/// └──────────────┴────────┴──────────────┴──────────┘
/// ```
pub fn encode_frame(address: [u8; 3], payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let start = dst.len();
    dst.reserve(PREFIX_LEN + payload.len() + 1);
    dst.put_slice(&address);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    let crc = checksum(&dst[start..]);
    dst.put_u8(crc);
    Ok(())
}

/// Encode the full byte sequence a controller sends for one frame:
/// sentinel, header, then the body from [`encode_frame`].
pub fn encode_wire(address: [u8; 3], payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    dst.reserve(1 + HEADER.len());
    dst.put_u8(SENTINEL);
    dst.put_slice(&HEADER);
    encode_frame(address, payload, dst)
}

/// Validate a complete frame body (prefix, payload, checksum).
pub fn decode_frame(mut frame: Bytes) -> std::result::Result<Frame, RejectReason> {
    let len = frame.len();
    if len < PREFIX_LEN + 1 || len != PREFIX_LEN + frame[PREFIX_LEN - 1] as usize + 1 {
        return Err(RejectReason::Malformed { len });
    }

    let expected = frame[len - 1];
    let computed = checksum(&frame[..len - 1]);
    if expected != computed {
        return Err(RejectReason::ChecksumMismatch { expected, computed });
    }

    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&frame[..PREFIX_LEN]);
    frame.truncate(len - 1);
    let payload = frame.split_off(PREFIX_LEN);

    Ok(Frame {
        prefix,
        payload,
        checksum: expected,
    })
}

/// Configuration for the frame reader.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Read timeout applied to serial channels. Default: 3 s.
    pub read_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}
