//! Register decoding for NIBE heat-pump frames.
//!
//! A validated payload is a run of packed register entries. Each entry is a
//! register ID followed by a 1- or 2-byte big-endian value; the width is only
//! visible from the bytes around it. This crate:
//!
//! - walks a payload into `(register, raw)` entries ([`PayloadEntries`])
//! - turns raw bytes into scaled values with a static rule table ([`rule_for`])
//! - keeps the last raw value per subscribed register and notifies
//!   subscribers only on change ([`RegisterTable`])

pub mod payload;
pub mod rules;
pub mod table;
pub mod value;

pub use payload::{decode_payload, PayloadEntries};
pub use rules::{decode, register_info, rule_for, DecodeRule, RegisterInfo, KNOWN_REGISTERS};
pub use table::{RegisterTable, Subscriber, Update, SOURCE_TAG};
pub use value::{RawValue, RegisterId, RegisterValue};
