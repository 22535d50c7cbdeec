//! Drive Sample Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time-ordered telemetry reading fed to the session accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveSample {
    pub timestamp: DateTime<Utc>,
    /// Vehicle speed in km/h.
    pub speed_kmh: u32,
    /// Engine speed in rpm.
    pub rpm: u32,
    /// Instantaneous fuel economy in km/L, zero when unknown.
    pub instant_kpl: f64,
}
