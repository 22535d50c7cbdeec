//! Frame Assembler State Machine
//!
//! Rebuilds complete vendor frames from a stream delivered in arbitrary
//! chunks. One frame is in progress at a time; the assembler is not safe for
//! concurrent byte feeds. Malformed input never errors: bad bytes are
//! absorbed and the machine resynchronizes on the next `FF 55` pair.

use tracing::{debug, warn};

/// Fixed backing buffer size. The write cursor wraps to 0 if it would run
/// past the end, which cannot happen for declared lengths within protocol
/// bounds.
const BUF_CAPACITY: usize = 1024;

/// Declared lengths above this are a protocol anomaly. They are logged and
/// still assembled; the checksum decides whether the frame survives.
const MAX_DECLARED_LEN: usize = 128;

const HEADER_0: u8 = 0xFF;
const HEADER_1: u8 = 0x55;

/// One complete, checksum-verified vendor frame.
///
/// The first payload byte is the message type; the rest is message data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub data: Vec<u8>,
}

/// Byte-at-a-time reassembly of `FF 55 <len> <type> <payload...> <checksum>`
/// frames.
pub struct FrameAssembler {
    buf: [u8; BUF_CAPACITY],
    /// Write cursor: also the number of bytes of the current frame seen so far.
    pos: usize,
    /// Payload length declared by the third byte of the frame in progress.
    declared_len: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: [0; BUF_CAPACITY],
            pos: 0,
            declared_len: 0,
        }
    }

    /// Consume one byte; returns a frame when this byte completes one whose
    /// checksum verifies.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        if self.pos >= BUF_CAPACITY {
            self.pos = 0;
        }
        self.buf[self.pos] = byte;
        self.pos += 1;

        match self.pos {
            1 => {
                if self.buf[0] != HEADER_0 {
                    self.pos = 0;
                }
                None
            }
            2 => {
                if self.buf[1] != HEADER_1 {
                    self.pos = 0;
                }
                None
            }
            3 => {
                self.declared_len = usize::from(self.buf[2]);
                if self.declared_len > MAX_DECLARED_LEN {
                    warn!(len = self.declared_len, "declared frame length exceeds protocol bound");
                }
                None
            }
            n if n == self.declared_len + 4 => {
                let end = self.declared_len + 3;
                let sum: u32 = self.buf[2..end].iter().map(|&b| u32::from(b)).sum();
                let frame = if (sum & 0xFF) as u8 == self.buf[end] {
                    let payload = &self.buf[3..end];
                    payload.split_first().map(|(&msg_type, data)| Frame {
                        msg_type,
                        data: data.to_vec(),
                    })
                } else {
                    debug!(
                        expected = self.buf[end],
                        actual = (sum & 0xFF) as u8,
                        "frame checksum mismatch, dropping"
                    );
                    None
                };
                self.declared_len = 0;
                self.pos = 0;
                frame
            }
            _ => None,
        }
    }

    /// Feed a chunk as the transport delivers it, collecting any frames it
    /// completes.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
