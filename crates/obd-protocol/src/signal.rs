//! Signal (PID) Registry
//!
//! Static catalog of every pollable signal: its request code, the ECU bus
//! header it must be addressed to, and the number of payload bytes in a
//! well-formed response.

use serde::{Deserialize, Serialize};

/// Diagnostic service a signal is requested through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Standard "request current data" service (0x01), batchable.
    Mode01,
    /// Manufacturer-extended service (0x22), one parameter per request.
    Mode22,
}

/// Logical identifier for a pollable vehicle signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SignalId {
    /// Short-term fuel trim bank 1 (%)
    ShortFuelTrim,
    /// Long-term fuel trim bank 1 (%)
    LongFuelTrim,
    /// Barometric pressure (kPa)
    BarometricPressure,
    /// Engine coolant temperature (°C)
    CoolantTemp,
    /// Calculated engine load (%)
    EngineLoad,
    /// Engine RPM
    Rpm,
    /// Vehicle speed (km/h)
    Speed,
    /// Intake air temperature (°C)
    IntakeTemp,
    /// Mass air flow rate (g/s)
    Maf,
    /// Throttle position (%)
    Throttle,
    /// Control module voltage (V)
    ModuleVoltage,
    /// Engine fuel rate (L/h)
    FuelRate,
    /// Ambient air temperature (°C)
    AmbientTemp,
    /// Catalyst temperature bank 1 (°C)
    CatalystTemp,
    /// Commanded equivalence ratio (lambda)
    EquivRatio,
    /// Fuel tank level input (%)
    FuelLevel,
    /// Intake manifold absolute pressure (kPa)
    IntakePressure,
    /// Current transmission gear (vendor extended)
    CurrentGear,
    /// Engine oil pressure (psi, vendor extended)
    OilPressure,
    /// Engine oil temperature (°C, vendor extended)
    OilTemp,
    /// Transmission fluid temperature (°C, vendor extended)
    TransFluidTemp,
}

impl SignalId {
    /// Every registered signal, in catalog order.
    pub const ALL: [SignalId; 21] = [
        SignalId::ShortFuelTrim,
        SignalId::LongFuelTrim,
        SignalId::BarometricPressure,
        SignalId::CoolantTemp,
        SignalId::EngineLoad,
        SignalId::Rpm,
        SignalId::Speed,
        SignalId::IntakeTemp,
        SignalId::Maf,
        SignalId::Throttle,
        SignalId::ModuleVoltage,
        SignalId::FuelRate,
        SignalId::AmbientTemp,
        SignalId::CatalystTemp,
        SignalId::EquivRatio,
        SignalId::FuelLevel,
        SignalId::IntakePressure,
        SignalId::CurrentGear,
        SignalId::OilPressure,
        SignalId::OilTemp,
        SignalId::TransFluidTemp,
    ];

    /// Hex request code: mode byte followed by the parameter id
    /// (one byte for Mode 01, two for Mode 22).
    pub fn code(&self) -> &'static str {
        match self {
            SignalId::ShortFuelTrim => "0106",
            SignalId::LongFuelTrim => "0107",
            SignalId::BarometricPressure => "0133",
            SignalId::CoolantTemp => "0105",
            SignalId::EngineLoad => "0104",
            SignalId::Rpm => "010C",
            SignalId::Speed => "010D",
            SignalId::IntakeTemp => "010F",
            SignalId::Maf => "0110",
            SignalId::Throttle => "0111",
            SignalId::ModuleVoltage => "0142",
            SignalId::FuelRate => "015E",
            SignalId::AmbientTemp => "0146",
            SignalId::CatalystTemp => "013C",
            SignalId::EquivRatio => "0144",
            SignalId::FuelLevel => "012F",
            SignalId::IntakePressure => "010B",
            SignalId::CurrentGear => "22199A",
            SignalId::OilPressure => "22115C",
            SignalId::OilTemp => "221154",
            SignalId::TransFluidTemp => "221940",
        }
    }

    /// Target ECU bus header the request must be framed with.
    /// Requests to different headers are never batched together.
    pub fn header(&self) -> &'static str {
        match self {
            SignalId::CurrentGear | SignalId::TransFluidTemp => "7E1",
            _ => "7E0",
        }
    }

    /// Number of payload bytes after the mode and parameter echo.
    pub fn data_bytes(&self) -> usize {
        match self {
            SignalId::Rpm
            | SignalId::Maf
            | SignalId::ModuleVoltage
            | SignalId::FuelRate
            | SignalId::CatalystTemp
            | SignalId::EquivRatio => 2,
            _ => 1,
        }
    }

    /// Diagnostic service this signal is requested through.
    pub fn mode(&self) -> Mode {
        if self.code().starts_with("22") {
            Mode::Mode22
        } else {
            Mode::Mode01
        }
    }

    /// Physical unit of the decoded value.
    pub fn unit(&self) -> &'static str {
        match self {
            SignalId::ShortFuelTrim
            | SignalId::LongFuelTrim
            | SignalId::EngineLoad
            | SignalId::Throttle
            | SignalId::FuelLevel => "%",
            SignalId::BarometricPressure | SignalId::IntakePressure => "kPa",
            SignalId::CoolantTemp
            | SignalId::IntakeTemp
            | SignalId::AmbientTemp
            | SignalId::CatalystTemp
            | SignalId::OilTemp
            | SignalId::TransFluidTemp => "°C",
            SignalId::Rpm => "rpm",
            SignalId::Speed => "km/h",
            SignalId::Maf => "g/s",
            SignalId::ModuleVoltage => "V",
            SignalId::FuelRate => "L/h",
            SignalId::EquivRatio => "λ",
            SignalId::CurrentGear => "",
            SignalId::OilPressure => "psi",
        }
    }

    /// Look a signal up by its full request code (e.g. "010C", "22199A").
    /// `None` means the parameter is not in the local catalog and callers
    /// should skip it.
    pub fn from_code(code: &str) -> Option<SignalId> {
        let code = code.to_ascii_uppercase();
        SignalId::ALL.iter().copied().find(|s| s.code() == code)
    }
}
