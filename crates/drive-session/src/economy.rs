//! MAF-Based Fuel Economy Estimation
//!
//! Estimates fuel flow from the mass-air-flow reading at a fixed air/fuel
//! ratio, corrected by the ECU fuel trims and barometric pressure.

use serde::{Deserialize, Serialize};

/// Combustion constants for the economy model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Stoichiometric air/fuel mass ratio.
    pub afr: f64,
    /// Fuel density in g/L.
    pub fuel_density_g_per_l: f64,
    /// Sea-level reference pressure in kPa.
    pub standard_baro_kpa: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            afr: 14.7,
            fuel_density_g_per_l: 720.0,
            standard_baro_kpa: 101.3,
        }
    }
}

/// Instantaneous economy in km/L from one sample. Returns 0.0 when the
/// corrected fuel flow is not positive (engine off, sensor dropout).
pub fn instant_kpl(
    maf_g_per_s: f64,
    speed_kmh: u32,
    stft_pct: f64,
    ltft_pct: f64,
    baro_kpa: f64,
    config: &EconomyConfig,
) -> f64 {
    let flow = corrected_flow_l_per_h(maf_g_per_s, stft_pct, ltft_pct, baro_kpa, config);
    if flow <= 0.0 {
        return 0.0;
    }
    f64::from(speed_kmh) / flow
}

fn corrected_flow_l_per_h(
    maf_g_per_s: f64,
    stft_pct: f64,
    ltft_pct: f64,
    baro_kpa: f64,
    config: &EconomyConfig,
) -> f64 {
    let base = maf_g_per_s * 3600.0 / (config.afr * config.fuel_density_g_per_l);
    let trim_factor = (1.0 + stft_pct / 100.0) * (1.0 + ltft_pct / 100.0);
    let baro_factor = baro_kpa / config.standard_baro_kpa;
    base * trim_factor * baro_factor
}

/// Whole-trip average economy: accumulates fuel and distance per sample
/// interval and divides at the end.
#[derive(Debug, Default)]
pub struct AverageEconomy {
    config: EconomyConfig,
    total_fuel_l: f64,
    total_distance_km: f64,
}

impl AverageEconomy {
    pub fn new(config: EconomyConfig) -> Self {
        Self {
            config,
            total_fuel_l: 0.0,
            total_distance_km: 0.0,
        }
    }

    /// Accumulate one sample covering `dt_secs` of driving.
    pub fn add_sample(
        &mut self,
        maf_g_per_s: f64,
        speed_kmh: u32,
        dt_secs: f64,
        stft_pct: f64,
        ltft_pct: f64,
        baro_kpa: f64,
    ) {
        let flow = corrected_flow_l_per_h(maf_g_per_s, stft_pct, ltft_pct, baro_kpa, &self.config);
        let hours = dt_secs / 3600.0;
        self.total_fuel_l += flow * hours;
        self.total_distance_km += f64::from(speed_kmh) * hours;
    }

    /// Average economy in km/L so far; 0.0 when no fuel has been burned.
    pub fn average_kpl(&self) -> f64 {
        if self.total_fuel_l > 0.0 {
            self.total_distance_km / self.total_fuel_l
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.total_fuel_l = 0.0;
        self.total_distance_km = 0.0;
    }
}
