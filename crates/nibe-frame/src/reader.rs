use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::codec::{
    decode_frame, Frame, FrameConfig, ACK, HEADER, MAX_PAYLOAD, PREFIX_LEN, SENTINEL,
};
use crate::error::{FrameError, Result};
use crate::outcome::{FrameOutcome, FrameState, FrameStats, RejectReason};

const INITIAL_BUFFER_CAPACITY: usize = PREFIX_LEN + MAX_PAYLOAD + 1;

/// Reads validated frames from a full-duplex channel, acknowledging as the
/// controller expects.
///
/// The reader owns the channel. Each call to [`next_attempt`](Self::next_attempt)
/// walks the state machine once and either returns a frame, a non-fatal
/// rejection, or a fatal error.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    stats: FrameStats,
}

impl<T: Read + Write> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: FrameStats::default(),
        }
    }

    /// Run one frame attempt.
    ///
    /// `Ok(Rejected(_))` covers noise, header mismatches, duplicate sentinels,
    /// checksum errors and an idle line; the caller simply tries again.
    /// `Err(_)` means the channel is unusable.
    pub fn next_attempt(&mut self) -> Result<FrameOutcome> {
        let mut state = FrameState::Syncing;
        loop {
            trace!(%state, "frame attempt");
            state = match state {
                FrameState::Syncing => {
                    let Some(byte) = read_sync_byte(&mut self.inner)? else {
                        self.stats.idle_timeouts += 1;
                        return Ok(FrameOutcome::Rejected(RejectReason::Idle));
                    };
                    if byte != SENTINEL {
                        self.stats.noise_bytes += 1;
                        return Ok(FrameOutcome::Rejected(RejectReason::Noise(byte)));
                    }

                    let mut header = [0u8; 2];
                    if !read_full(&mut self.inner, &mut header, state)? {
                        return Ok(self.timed_out(state));
                    }
                    if header != HEADER {
                        self.stats.header_mismatches += 1;
                        trace!(?header, "header mismatch");
                        return Ok(FrameOutcome::Rejected(RejectReason::HeaderMismatch(header)));
                    }
                    FrameState::HeaderMatched
                }
                FrameState::HeaderMatched => {
                    self.ack()?;
                    FrameState::AwaitingPrefix
                }
                FrameState::AwaitingPrefix => {
                    self.buf.clear();
                    self.buf.resize(PREFIX_LEN, 0);
                    if !read_full(&mut self.inner, &mut self.buf[..], state)? {
                        return Ok(self.timed_out(state));
                    }
                    if self.buf[0] == SENTINEL {
                        self.stats.duplicate_sentinels += 1;
                        debug!("duplicate sentinel in prefix");
                        return Ok(FrameOutcome::Rejected(RejectReason::DuplicateSentinel));
                    }
                    FrameState::AwaitingPayload
                }
                FrameState::AwaitingPayload => {
                    let length = self.buf[PREFIX_LEN - 1] as usize;
                    let total = PREFIX_LEN + length + 1;
                    self.buf.resize(total, 0);
                    if !read_full(&mut self.inner, &mut self.buf[PREFIX_LEN..total], state)? {
                        return Ok(self.timed_out(state));
                    }
                    self.ack()?;
                    FrameState::Validating
                }
                FrameState::Validating => {
                    let body = self.buf.split().freeze();
                    return Ok(match decode_frame(body) {
                        Ok(frame) => {
                            self.stats.accepted += 1;
                            debug!(length = frame.payload.len(), "frame accepted");
                            FrameOutcome::Accepted(frame)
                        }
                        Err(reason) => {
                            if matches!(reason, RejectReason::ChecksumMismatch { .. }) {
                                self.stats.checksum_errors += 1;
                            }
                            warn!(%reason, "frame crc error");
                            FrameOutcome::Rejected(reason)
                        }
                    });
                }
            };
        }
    }

    /// Read the next accepted frame (blocking), skipping rejected attempts.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let FrameOutcome::Accepted(frame) = self.next_attempt()? {
                return Ok(frame);
            }
        }
    }

    fn timed_out(&mut self, state: FrameState) -> FrameOutcome {
        self.stats.idle_timeouts += 1;
        debug!(%state, "read timed out, resyncing");
        FrameOutcome::Rejected(RejectReason::Timeout(state))
    }

    fn ack(&mut self) -> Result<()> {
        self.inner.write_all(&[ACK])?;
        self.inner.flush()?;
        self.stats.acks_written += 1;
        Ok(())
    }

    /// Counters accumulated since the reader was created.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner channel.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(unix)]
impl FrameReader<nibe_transport::SerialChannel> {
    /// Create a frame reader for a serial channel and apply the read timeout from config.
    pub fn with_config_serial(
        mut inner: nibe_transport::SerialChannel,
        config: FrameConfig,
    ) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner
                .set_timeout(timeout)
                .map_err(transport_to_frame_error)?;
        }
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(unix)]
fn transport_to_frame_error(err: nibe_transport::TransportError) -> FrameError {
    match err {
        nibe_transport::TransportError::Io(io)
        | nibe_transport::TransportError::Configure { source: io, .. }
        | nibe_transport::TransportError::Capture { source: io, .. } => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Read one byte; `None` when the read timed out with nothing received.
fn read_sync_byte<T: Read>(inner: &mut T) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match inner.read(&mut byte) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(err.kind()) => return Ok(None),
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

/// Fill `buf` completely. `Ok(false)` when the read timed out before any byte
/// arrived; a timeout part-way is a short read.
fn read_full<T: Read>(inner: &mut T, buf: &mut [u8], state: FrameState) -> Result<bool> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(err.kind()) && filled == 0 => return Ok(false),
            Err(err) if is_timeout(err.kind()) => {
                return Err(FrameError::ShortRead {
                    state,
                    expected: buf.len(),
                    received: filled,
                })
            }
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(true)
}
