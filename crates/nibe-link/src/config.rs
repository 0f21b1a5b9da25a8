use nibe_frame::FrameConfig;

/// Settings for opening a link.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    /// Serial line settings (19200 baud, mark parity, 3 s timeout).
    #[cfg(unix)]
    pub serial: nibe_transport::SerialConfig,
    /// Frame reader settings.
    pub frame: FrameConfig,
}
