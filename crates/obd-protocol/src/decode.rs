//! Signal Decoders
//!
//! Pure functions mapping a verified response frame to a physical value.
//! Every formula is total over the byte range 0–255; malformed or truncated
//! frames are rejected up front instead of being read out of bounds.

use crate::error::DecodeError;
use crate::signal::{Mode, SignalId};
use serde::{Deserialize, Serialize};

/// Decoded physical value.
///
/// Decoders return one tagged type instead of a dynamically cast numeric so
/// call sites never downcast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Float(f64),
}

impl Value {
    /// The value widened to `f64`, whichever variant it is.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(i) => f64::from(i),
            Value::Float(f) => f,
        }
    }
}

/// Decode the data bytes of `signal` into a physical value.
///
/// `a` is the first data byte; `b` is the second and is ignored for
/// single-byte signals. Total over all inputs.
pub fn decode_bytes(signal: SignalId, a: u8, b: u8) -> Value {
    let a = i32::from(a);
    let b = i32::from(b);
    let wide = (a << 8) | b;
    match signal {
        SignalId::Rpm => Value::Int(wide / 4),
        SignalId::Speed => Value::Int(a),
        SignalId::CoolantTemp
        | SignalId::IntakeTemp
        | SignalId::AmbientTemp
        | SignalId::OilTemp
        | SignalId::TransFluidTemp => Value::Int(a - 40),
        SignalId::Throttle | SignalId::EngineLoad => Value::Int(a * 100 / 255),
        SignalId::Maf => Value::Float(f64::from(wide) / 100.0),
        SignalId::ModuleVoltage => Value::Float(f64::from(wide) / 1000.0),
        SignalId::FuelRate => Value::Float(f64::from(wide) / 20.0),
        SignalId::ShortFuelTrim | SignalId::LongFuelTrim => {
            Value::Float(f64::from(a - 128) * 100.0 / 128.0)
        }
        SignalId::BarometricPressure | SignalId::IntakePressure => Value::Float(f64::from(a)),
        SignalId::CatalystTemp => Value::Float(f64::from(wide) / 10.0 - 40.0),
        SignalId::EquivRatio => Value::Float(f64::from(wide) / 32768.0),
        SignalId::FuelLevel => Value::Float(f64::from(a) * 100.0 / 255.0),
        SignalId::CurrentGear => Value::Int(a),
        SignalId::OilPressure => Value::Float(f64::from(a) * 0.65 - 17.5),
    }
}

/// Decode a hex response frame (mode echo + parameter echo + data bytes)
/// for `signal`.
///
/// The echo prefix is two hex chars of mode plus two (Mode 01) or four
/// (Mode 22) of parameter id; the data bytes follow. The frame length is
/// checked before any slicing.
pub fn decode_frame(signal: SignalId, frame: &str) -> Result<Value, DecodeError> {
    let compact: String = frame
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if !compact.is_ascii() {
        return Err(DecodeError::InvalidHex(compact));
    }

    let prefix = match signal.mode() {
        Mode::Mode01 => 4,
        Mode::Mode22 => 6,
    };
    let needed = prefix + signal.data_bytes() * 2;
    if compact.len() < needed {
        return Err(DecodeError::TruncatedFrame {
            signal,
            needed,
            got: compact.len(),
        });
    }

    let a = parse_hex_byte(&compact[prefix..prefix + 2])?;
    let b = if signal.data_bytes() == 2 {
        parse_hex_byte(&compact[prefix + 2..prefix + 4])?
    } else {
        0
    };
    Ok(decode_bytes(signal, a, b))
}

fn parse_hex_byte(pair: &str) -> Result<u8, DecodeError> {
    u8::from_str_radix(pair, 16).map_err(|_| DecodeError::InvalidHex(pair.to_string()))
}
