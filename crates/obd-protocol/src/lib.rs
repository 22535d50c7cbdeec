//! OBD-II Protocol Implementation
//!
//! This crate provides the wire-level building blocks for polling vehicle
//! telemetry over a diagnostic adapter: a static PID registry, per-signal
//! decoders, and the Mode 01 (multi-PID) and Mode 22 (vendor-extended)
//! request/response codecs.

mod decode;
mod error;
pub mod mode01;
pub mod mode22;
mod signal;

pub use decode::{decode_bytes, decode_frame, Value};
pub use error::{BatchError, DecodeError};
pub use signal::{Mode, SignalId};
