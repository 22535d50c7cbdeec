//! Mode 22 Extended-PID Codec
//!
//! Vendor-extended signals use service 0x22 with a two-byte parameter id and
//! are not combinable: the ECU accepts exactly one parameter per request.

use crate::decode::{decode_frame, Value};
use crate::error::{BatchError, DecodeError};
use crate::signal::{Mode, SignalId};
use std::collections::HashMap;
use tracing::debug;

/// Hardware limit: extended PIDs go one per request.
pub const MAX_PIDS: usize = 1;

const MODE: &str = "22";
const ECHO: &str = "62";

/// Build a space-joined hex command for one extended signal,
/// e.g. `"22 19 9A"`.
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
    if let Some(&bad) = signals.iter().find(|s| s.mode() != Mode::Mode22) {
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
    Ok(raw
        .as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).expect("hex command is ascii"))
        .collect::<Vec<_>>()
        .join(" "))
}

/// Parse a Mode 22 response: `62`, then repeating two-byte parameter id plus
/// one data byte. Unknown parameter ids end parsing with the partial result,
/// mirroring the Mode 01 policy.
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
    // parameter id (4 hex chars) + one data byte (2 hex chars)
    while offset + 6 <= compact.len() {
        let pid = &compact[offset..offset + 4];
        let signal = match SignalId::from_code(&format!("{MODE}{pid}")) {
            Some(signal) => signal,
            None => {
                debug!(pid, "unknown extended parameter id, keeping partial result");
                break;
            }
        };
        let segment = &compact[offset - 2..offset + 6];
        values.insert(signal, decode_frame(signal, segment)?);
        offset += 6;
    }
    Ok(values)
}
