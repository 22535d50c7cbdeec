//! Frame Router
//!
//! Dispatches a reassembled frame by its message type.

use crate::assembler::Frame;
use tracing::debug;

/// Messages the adapter pushes unsolicited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorEvent {
    /// Periodic vehicle state snapshot (types 1 and 3).
    CarState(Vec<u8>),
    /// The adapter expects a heartbeat reply (see [`crate::heartbeat_reply`]).
    HeartbeatRequest,
    /// A message type this build does not understand.
    Unknown { msg_type: u8 },
}

/// Route one frame to the event its message type denotes.
pub fn route(frame: Frame) -> VendorEvent {
    match frame.msg_type {
        1 | 3 => VendorEvent::CarState(frame.data),
        55 => VendorEvent::HeartbeatRequest,
        msg_type => {
            debug!(msg_type, "unknown vendor message type");
            VendorEvent::Unknown { msg_type }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_state_types_carry_data() {
        let event = route(Frame { msg_type: 1, data: vec![0x10, 0x20] });
        assert_eq!(event, VendorEvent::CarState(vec![0x10, 0x20]));
        let event = route(Frame { msg_type: 3, data: vec![] });
        assert_eq!(event, VendorEvent::CarState(vec![]));
    }

    #[test]
    fn heartbeat_type_maps_to_request() {
        let event = route(Frame { msg_type: 55, data: vec![] });
        assert_eq!(event, VendorEvent::HeartbeatRequest);
    }

    #[test]
    fn unhandled_type_is_reported() {
        let event = route(Frame { msg_type: 0x7F, data: vec![] });
        assert_eq!(event, VendorEvent::Unknown { msg_type: 0x7F });
    }
}
