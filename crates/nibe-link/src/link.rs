use std::io::{Read, Write};
use std::sync::Arc;

use nibe_frame::{FrameConfig, FrameOutcome, FrameReader, FrameStats};
use nibe_registers::{RegisterId, RegisterTable, Subscriber};
use nibe_transport::ReplayChannel;
use tracing::{info, trace, warn};

use crate::control::StopHandle;
use crate::error::{LinkError, Result};

/// Counters of a link session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames that passed checksum validation.
    pub frames: u64,
    /// Register updates delivered to subscribers.
    pub updates: u64,
    /// Frame reader counters.
    pub frame: FrameStats,
}

/// A read-only session with the heat-pump controller.
pub struct Link<C> {
    reader: FrameReader<C>,
    registers: Arc<RegisterTable>,
    stop: StopHandle,
    stats: LinkStats,
}

impl<C: Read + Write> Link<C> {
    /// Build a link over any full-duplex channel with default frame settings.
    pub fn new(channel: C, registers: Arc<RegisterTable>) -> Self {
        Self::with_config(channel, registers, FrameConfig::default())
    }

    /// Build a link over any full-duplex channel.
    pub fn with_config(channel: C, registers: Arc<RegisterTable>, config: FrameConfig) -> Self {
        Self::from_reader(FrameReader::with_config(channel, config), registers)
    }

    fn from_reader(reader: FrameReader<C>, registers: Arc<RegisterTable>) -> Self {
        Self {
            reader,
            registers,
            stop: StopHandle::new(),
            stats: LinkStats::default(),
        }
    }

    /// Close `closer` as part of [`StopHandle::stop`].
    pub fn with_closer(mut self, closer: nibe_transport::ChannelCloser) -> Self {
        self.stop.set_closer(closer);
        self
    }

    /// Subscribe to a register on the shared table.
    pub fn subscribe(&self, register: RegisterId, subscriber: impl Subscriber + 'static) {
        self.registers.subscribe(register, subscriber);
    }

    /// The shared register table.
    pub fn registers(&self) -> &Arc<RegisterTable> {
        &self.registers
    }

    /// Handle that stops [`run`](Self::run) from another thread or a subscriber.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the read loop until stopped or until the channel fails (blocking).
    ///
    /// Returns `Ok` when the loop ended because of [`StopHandle::stop`],
    /// including when the stop closed the channel under a pending read.
    /// Any other channel failure is returned as an error.
    pub fn run(&mut self) -> Result<LinkStats> {
        info!("link started");
        while self.stop.is_running() {
            match self.reader.next_attempt() {
                Ok(FrameOutcome::Accepted(frame)) => {
                    self.stats.frames += 1;
                    let changed = self.registers.dispatch(&frame.payload);
                    self.stats.updates += changed as u64;
                }
                Ok(FrameOutcome::Rejected(reason)) => {
                    trace!(%reason, "frame rejected");
                }
                Err(err) => {
                    self.stats.frame = self.reader.stats();
                    if !self.stop.is_running() {
                        info!(frames = self.stats.frames, "link stopped");
                        return Ok(self.stats);
                    }
                    warn!(error = %err, "nibe link terminated");
                    return Err(LinkError::Frame(err));
                }
            }
        }

        self.stats.frame = self.reader.stats();
        info!(frames = self.stats.frames, "link stopped");
        Ok(self.stats)
    }

    /// Counters so far.
    pub fn stats(&self) -> LinkStats {
        LinkStats {
            frame: self.reader.stats(),
            ..self.stats
        }
    }

    /// Borrow the underlying channel.
    pub fn channel(&self) -> &C {
        self.reader.get_ref()
    }

    /// Consume the link and return the channel.
    pub fn into_inner(self) -> C {
        self.reader.into_inner()
    }
}

impl<R: Read> Link<ReplayChannel<R>> {
    /// Build a link over a replayed capture; stopping closes the replay.
    pub fn replay(channel: ReplayChannel<R>, registers: Arc<RegisterTable>) -> Self {
        let closer = channel.closer();
        Self::new(channel, registers).with_closer(closer)
    }
}

#[cfg(unix)]
impl Link<nibe_transport::SerialChannel> {
    /// Open the serial device at `path` and build a link over it.
    pub fn open(
        path: impl AsRef<std::path::Path>,
        registers: Arc<RegisterTable>,
        config: &crate::LinkConfig,
    ) -> Result<Self> {
        let channel = nibe_transport::SerialChannel::open(path, &config.serial)?;
        let closer = channel.closer();
        let reader = FrameReader::with_config_serial(channel, config.frame.clone())?;
        Ok(Self::from_reader(reader, registers).with_closer(closer))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Mutex;

    use bytes::BytesMut;
    use nibe_frame::{encode_wire, FrameError, ACK, DATA_ADDRESS};
    use nibe_registers::{RegisterValue, Update};

    use super::*;

    // reg 1 = -1.0, reg 25 = 10, reg 40 = 25.0
    const PAYLOAD: [u8; 12] = [
        0x00, 0x01, 0xFF, 0xF6, 0x00, 0x19, 0x64, 0x00, 0x28, 0x00, 0x32, 0x00,
    ];

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_wire(DATA_ADDRESS, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn collect(link: &Link<impl Read + Write>, register: RegisterId) -> Arc<Mutex<Vec<Update>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        link.subscribe(register, move |update: &Update| {
            sink.lock().unwrap().push(update.clone());
        });
        seen
    }

    #[test]
    fn replay_dispatches_until_end_of_capture() {
        let mut bytes = vec![0x42, 0x99];
        bytes.extend(wire(&PAYLOAD));
        let channel = ReplayChannel::from_bytes(bytes);

        let mut link = Link::replay(channel, Arc::new(RegisterTable::new()));
        let outdoor = collect(&link, 1);
        let hysteresis = collect(&link, 40);

        let err = link.run().unwrap_err();
        assert!(err.is_end_of_stream());

        assert_eq!(outdoor.lock().unwrap()[0].value, RegisterValue::Float(-1.0));
        assert_eq!(hysteresis.lock().unwrap()[0].value, RegisterValue::Float(25.0));

        let stats = link.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.updates, 2);
        assert_eq!(stats.frame.noise_bytes, 2);
        assert_eq!(link.channel().written(), &[ACK, ACK]);
    }

    #[test]
    fn repeated_frame_notifies_once() {
        let mut bytes = wire(&PAYLOAD);
        bytes.extend(wire(&PAYLOAD));

        let mut link = Link::replay(
            ReplayChannel::from_bytes(bytes),
            Arc::new(RegisterTable::new()),
        );
        let starts = collect(&link, 25);

        let _ = link.run();

        assert_eq!(starts.lock().unwrap().len(), 1);
        assert_eq!(link.stats().frames, 2);
        assert_eq!(link.stats().updates, 1);
    }

    #[test]
    fn corrupted_frame_is_not_dispatched() {
        let mut bad = wire(&PAYLOAD);
        bad[8] ^= 0x10;

        let mut link = Link::replay(ReplayChannel::from_bytes(bad), Arc::new(RegisterTable::new()));
        let outdoor = collect(&link, 1);

        let _ = link.run();

        assert!(outdoor.lock().unwrap().is_empty());
        assert_eq!(link.stats().frame.checksum_errors, 1);
    }

    #[test]
    fn subscriber_can_stop_the_link() {
        let mut bytes = wire(&PAYLOAD);
        let mut second = PAYLOAD;
        second[6] = 0x65;
        bytes.extend(wire(&second));

        let mut link = Link::replay(
            ReplayChannel::from_bytes(bytes),
            Arc::new(RegisterTable::new()),
        );
        let stop = link.stop_handle();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        link.subscribe(25, move |_: &Update| {
            seen.fetch_add(1, Ordering::SeqCst);
            stop.stop();
        });

        let stats = link.run().unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn stopped_before_run_returns_immediately() {
        let mut link = Link::replay(
            ReplayChannel::from_bytes(wire(&PAYLOAD)),
            Arc::new(RegisterTable::new()),
        );
        link.stop_handle().stop();

        let stats = link.run().unwrap();
        assert_eq!(stats, LinkStats::default());
    }

    /// Channel fed from another thread; a read blocks until data arrives and
    /// fails once the sender is dropped.
    struct PipeChannel {
        rx: Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for PipeChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                self.pending = self
                    .rx
                    .recv()
                    .map_err(|_| io::Error::from(ErrorKind::BrokenPipe))?;
            }
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    impl Write for PipeChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stop_unblocks_a_pending_read() {
        let (tx, rx) = mpsc::channel();
        let registers = Arc::new(RegisterTable::new());
        let mut link = Link::new(
            PipeChannel {
                rx,
                pending: Vec::new(),
            },
            Arc::clone(&registers),
        );
        let stop = link.stop_handle();

        let (seen_tx, seen_rx) = mpsc::channel();
        let seen_tx = Mutex::new(seen_tx);
        registers.subscribe(25, move |update: &Update| {
            let _ = seen_tx.lock().unwrap().send(update.value);
        });

        let runner = std::thread::spawn(move || link.run());

        tx.send(wire(&PAYLOAD)).unwrap();
        assert_eq!(seen_rx.recv().unwrap(), RegisterValue::Integer(10));

        // The loop is now blocked waiting for the next sync byte.
        stop.stop();
        drop(tx);

        let stats = runner.join().unwrap().unwrap();
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn channel_failure_is_fatal() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        drop(tx);
        let mut link = Link::new(
            PipeChannel {
                rx,
                pending: Vec::new(),
            },
            Arc::new(RegisterTable::new()),
        );

        let err = link.run().unwrap_err();
        assert!(matches!(
            err,
            LinkError::Frame(FrameError::Io(ref e)) if e.kind() == ErrorKind::BrokenPipe
        ));
        assert!(!err.is_end_of_stream());
    }
}
