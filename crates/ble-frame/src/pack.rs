//! Outbound Frame Packing

/// Pack a message for the adapter: `FF 55 <len> <type> <payload> <checksum>`.
///
/// `<len>` counts the type byte plus payload; the checksum sums every byte
/// from `<len>` through the end of the payload, mod 256.
pub fn pack_frame(msg_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.push(0xFF);
    out.push(0x55);
    out.push((payload.len() + 1) as u8);
    out.push(msg_type);
    out.extend_from_slice(payload);
    let sum: u32 = out[2..].iter().map(|&b| u32::from(b)).sum();
    out.push((sum & 0xFF) as u8);
    out
}

/// Reply the adapter expects when it asks for a heartbeat.
pub fn heartbeat_reply() -> Vec<u8> {
    pack_frame(55, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FrameAssembler;

    #[test]
    fn packs_header_length_and_checksum() {
        let frame = pack_frame(0x01, &[0x0A, 0x0B]);
        assert_eq!(frame[..4], [0xFF, 0x55, 0x03, 0x01]);
        let expected = (0x03u32 + 0x01 + 0x0A + 0x0B) as u8;
        assert_eq!(*frame.last().unwrap(), expected);
    }

    #[test]
    fn heartbeat_round_trips_through_assembler() {
        let mut asm = FrameAssembler::new();
        let frames = asm.feed_bytes(&heartbeat_reply());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].msg_type, 55);
        assert!(frames[0].data.is_empty());
    }
}
