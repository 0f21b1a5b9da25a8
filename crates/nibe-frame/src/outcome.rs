use std::fmt;

use crate::codec::Frame;

/// Phase of a single frame attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Looking for the sentinel and the fixed header.
    Syncing,
    /// Header seen; the first acknowledgment is due.
    HeaderMatched,
    /// Reading the 4-byte prefix.
    AwaitingPrefix,
    /// Reading payload and checksum; the second acknowledgment follows.
    AwaitingPayload,
    /// Checking the XOR checksum.
    Validating,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameState::Syncing => "syncing",
            FrameState::HeaderMatched => "header matched",
            FrameState::AwaitingPrefix => "awaiting prefix",
            FrameState::AwaitingPayload => "awaiting payload",
            FrameState::Validating => "validating",
        };
        f.write_str(name)
    }
}

/// Why a frame attempt ended without a payload. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The sync read timed out with no data.
    Idle,
    /// A read after the sentinel timed out before any of its bytes arrived.
    Timeout(FrameState),
    /// A byte other than the sentinel was skipped.
    Noise(u8),
    /// The two bytes after the sentinel were not the expected header.
    HeaderMismatch([u8; 2]),
    /// The prefix started with the sentinel again (sender retransmitted).
    DuplicateSentinel,
    /// The body length does not agree with its length byte.
    Malformed { len: usize },
    /// The trailing checksum did not match the XOR of the frame.
    ChecksumMismatch { expected: u8, computed: u8 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Idle => f.write_str("idle"),
            RejectReason::Timeout(state) => write!(f, "timed out while {state}"),
            RejectReason::Noise(byte) => write!(f, "noise byte {byte:#04x}"),
            RejectReason::HeaderMismatch([a, b]) => {
                write!(f, "header mismatch ({a:#04x} {b:#04x})")
            }
            RejectReason::DuplicateSentinel => f.write_str("duplicate sentinel"),
            RejectReason::Malformed { len } => write!(f, "malformed frame ({len} bytes)"),
            RejectReason::ChecksumMismatch { expected, computed } => write!(
                f,
                "checksum mismatch (frame {expected:#04x}, computed {computed:#04x})"
            ),
        }
    }
}

/// Result of one frame attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Accepted(Frame),
    Rejected(RejectReason),
}

impl FrameOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FrameOutcome::Accepted(_))
    }
}

/// Running counters of the frame reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub accepted: u64,
    pub idle_timeouts: u64,
    pub noise_bytes: u64,
    pub header_mismatches: u64,
    pub duplicate_sentinels: u64,
    pub checksum_errors: u64,
    pub acks_written: u64,
}

impl FrameStats {
    /// Attempts that ended without a payload.
    pub fn rejected(&self) -> u64 {
        self.idle_timeouts
            + self.noise_bytes
            + self.header_mismatches
            + self.duplicate_sentinels
            + self.checksum_errors
    }
}
