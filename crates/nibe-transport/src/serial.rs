use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};
use tracing::{debug, info};

use crate::closer::ChannelCloser;
use crate::error::{Result, TransportError};

/// Line speed used by the heat-pump controller.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Read timeout. Bounded so that a dead line surfaces instead of hanging.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Longest a single device read blocks before the close flag is checked again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Parity mode of the link.
///
/// The controller uses the ninth bit for addressing, which a UART expresses
/// as mark parity (parity bit always 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkParity {
    None,
    Even,
    Odd,
    #[default]
    Mark,
}

impl LinkParity {
    fn base(self) -> Parity {
        match self {
            LinkParity::None => Parity::None,
            LinkParity::Even => Parity::Even,
            // Mark is odd parity plus CMSPAR ("stick" parity).
            LinkParity::Odd | LinkParity::Mark => Parity::Odd,
        }
    }
}

/// Serial line settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. Default: 19200.
    pub baud_rate: u32,
    /// Read/write timeout. Default: 3 s.
    pub timeout: Duration,
    /// Parity mode. Default: mark.
    pub parity: LinkParity,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            parity: LinkParity::default(),
        }
    }
}

/// An open serial device, 8 data bits, one stop bit, no flow control.
pub struct SerialChannel {
    port: TTYPort,
    path: PathBuf,
    timeout: Duration,
    closer: ChannelCloser,
}

impl SerialChannel {
    /// Open and configure the serial device at `path`.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.to_string_lossy().into_owned();

        let port = serialport::new(name, config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .parity(config.parity.base())
            .timeout(config.timeout.min(POLL_INTERVAL))
            .open_native()
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        if config.parity == LinkParity::Mark {
            enable_mark_parity(&port, &path)?;
        }

        info!(
            path = %path.display(),
            baud = config.baud_rate,
            parity = ?config.parity,
            "opened serial channel"
        );

        Ok(Self {
            port,
            path,
            timeout: config.timeout,
            closer: ChannelCloser::new(),
        })
    }

    /// Set the read timeout. Reads still wake every 100 ms to notice a close.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port
            .set_timeout(timeout.min(POLL_INTERVAL))
            .map_err(|err| TransportError::Io(err.into()))?;
        self.timeout = timeout;
        Ok(())
    }

    /// Handle that closes this channel from another thread.
    pub fn closer(&self) -> ChannelCloser {
        self.closer.clone()
    }

    /// Device path this channel was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let port = &mut self.port;
        read_polled(&self.closer, self.timeout, || port.read(buf))
    }
}

/// Repeat short device reads until data arrives, `timeout` has elapsed or
/// the channel is closed.
fn read_polled(
    closer: &ChannelCloser,
    timeout: Duration,
    mut read: impl FnMut() -> io::Result<usize>,
) -> io::Result<usize> {
    let deadline = Instant::now() + timeout;
    loop {
        closer.check()?;
        match read() {
            Err(err) if err.kind() == ErrorKind::TimedOut && Instant::now() < deadline => {}
            other => return other,
        }
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.closer.check()?;
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.closer.check()?;
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .field("closed", &self.closer.is_closed())
            .finish()
    }
}

#[cfg(target_os = "linux")]
fn enable_mark_parity(port: &TTYPort, path: &Path) -> Result<()> {
    use std::os::fd::AsRawFd;

    let fd = port.as_raw_fd();
    let configure = |source| TransportError::Configure {
        path: path.to_path_buf(),
        source,
    };

    // SAFETY: `termios` is a plain C struct for which all-zero is a valid
    // bit pattern; tcgetattr overwrites it before it is read.
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is the open tty owned by `port` and `termios` is a valid
    // writable pointer for the duration of the call.
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(configure(std::io::Error::last_os_error()));
    }

    termios.c_cflag |= libc::PARENB | libc::CMSPAR | libc::PARODD;

    // SAFETY: same descriptor as above; `termios` was filled by tcgetattr.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(configure(std::io::Error::last_os_error()));
    }

    debug!(path = %path.display(), "mark parity enabled");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn enable_mark_parity(_port: &TTYPort, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "mark parity requested without CMSPAR");
    Err(TransportError::Unsupported(
        "mark parity requires CMSPAR (Linux only)".to_string(),
    ))
}
