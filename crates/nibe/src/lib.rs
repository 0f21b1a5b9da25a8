//! Read-only decoder for the NIBE heat-pump RS-485 link.
//!
//! The controller pushes register snapshots over a mark-parity serial line.
//! This crate re-exports the layers that turn those bytes into values.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial and replay channels
//! - [`frame`]: Sync, handshake and checksum validation
//! - [`registers`]: Payload walk, decode rules and change dispatch
//! - [`link`]: Run loop and stop control

/// Re-export transport types.
pub mod transport {
    pub use nibe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use nibe_frame::*;
}

/// Re-export register types.
pub mod registers {
    pub use nibe_registers::*;
}

/// Re-export link types.
pub mod link {
    pub use nibe_link::*;
}
