//! Vendor BLE Frame Codec
//!
//! The in-vehicle adapter speaks a binary dialect over BLE notifications:
//! `FF 55 <len> <type> <payload...> <checksum>`, checksum being the byte sum
//! from `<len>` through the end of the payload, mod 256. This crate
//! reassembles complete frames from the raw notification byte stream, routes
//! them by message type, and packs outbound frames in the same format.

mod assembler;
mod pack;
mod router;

pub use assembler::{Frame, FrameAssembler};
pub use pack::{heartbeat_reply, pack_frame};
pub use router::{route, VendorEvent};
