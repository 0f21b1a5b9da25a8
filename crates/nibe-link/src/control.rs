use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nibe_transport::ChannelCloser;
use tracing::info;

/// Stops a running [`Link`](crate::Link).
///
/// The flag is checked once per frame attempt. When the link was built with a
/// channel closer, stopping also closes the channel so a blocked read fails
/// instead of waiting for the next frame.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
    closer: Option<ChannelCloser>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            closer: None,
        }
    }

    pub(crate) fn set_closer(&mut self, closer: ChannelCloser) {
        self.closer = Some(closer);
    }

    /// Clear the running flag and close the channel.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("link stop requested");
        }
        if let Some(closer) = &self.closer {
            closer.close();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
