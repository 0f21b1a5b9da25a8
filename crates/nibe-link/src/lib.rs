//! Session layer for the NIBE heat-pump RS-485 link.
//!
//! A [`Link`] owns the channel and the frame reader, runs the blocking read
//! loop and hands every accepted payload to a shared
//! [`RegisterTable`](nibe_registers::RegisterTable). A [`StopHandle`] ends the
//! loop from another thread.

pub mod config;
pub mod control;
pub mod error;
pub mod link;

pub use config::LinkConfig;
pub use control::StopHandle;
pub use error::{LinkError, Result};
pub use link::{Link, LinkStats};
