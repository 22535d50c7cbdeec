//! Mode 01 Multi-PID Codec
//!
//! Builds a single bus request for up to [`MAX_PIDS`] standard signals and
//! demultiplexes the combined response back into per-signal values. Response
//! group boundaries carry no length prefix; they are inferred from each
//! signal's registered data length.

use crate::decode::{decode_frame, Value};
use crate::error::{BatchError, DecodeError};
use crate::signal::{Mode, SignalId};
use std::collections::HashMap;
use tracing::debug;

/// CAN payload limit: at most this many PIDs per Mode 01 request.
pub const MAX_PIDS: usize = 5;

const MODE: &str = "01";
const ECHO: &str = "41";

/// Build a space-joined hex command for a batch of Mode 01 signals,
/// e.g. `"01 0C 0D 05"`.
///
/// All signals must share the Mode 01 request prefix and the batch must hold
/// 1..=[`MAX_PIDS`] entries; violations fail loudly at call time.
pub fn build_command(signals: &[SignalId]) -> Result<String, BatchError> {
    if signals.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    if signals.len() > MAX_PIDS {
        return Err(BatchError::BatchTooLarge {
            len: signals.len(),
            max: MAX_PIDS,
        });
    }
    if let Some(&bad) = signals.iter().find(|s| s.mode() != Mode::Mode01) {
        return Err(BatchError::MixedMode {
            signal: bad,
            code: bad.code(),
            mode: MODE,
        });
    }

    let mut raw = String::from(MODE);
    for signal in signals {
        raw.push_str(&signal.code()[2..]);
    }
    Ok(space_join_bytes(&raw))
}

/// Parse a combined Mode 01 response into per-signal values.
///
/// An unknown parameter id mid-stream stops parsing and the values decoded
/// so far are returned; trailing bytes may belong to signals outside the
/// local catalog. A response that does not echo `41`, or a group cut short
/// of its registered data length, is an error.
pub fn parse_response(response: &str) -> Result<HashMap<SignalId, Value>, BatchError> {
    let compact: String = response
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if !compact.is_ascii() {
        return Err(DecodeError::InvalidHex(compact).into());
    }
    if !compact.starts_with(ECHO) {
        return Err(BatchError::UnexpectedEcho {
            expected: ECHO,
            got: compact.chars().take(2).collect(),
        });
    }

    let mut values = HashMap::new();
    let mut offset = 2;
    while offset + 2 <= compact.len() {
        let pid = &compact[offset..offset + 2];
        let signal = match SignalId::from_code(&format!("{MODE}{pid}")) {
            Some(signal) => signal,
            None => {
                debug!(pid, "unknown parameter id, keeping partial result");
                break;
            }
        };
        // mode echo + pid + data, sliced for the per-signal decoder
        let segment = &compact[offset - 2..];
        values.insert(signal, decode_frame(signal, segment)?);
        offset += 2 + signal.data_bytes() * 2;
    }
    Ok(values)
}

fn space_join_bytes(raw: &str) -> String {
    raw.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).expect("hex command is ascii"))
        .collect::<Vec<_>>()
        .join(" ")
}
