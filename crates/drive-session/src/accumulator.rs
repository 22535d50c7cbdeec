//! Session Summary Accumulator
//!
//! Streaming aggregation over strictly time-ordered samples. Distance is a
//! trapezoidal integral of speed; fuel is `speed / instant economy`
//! integrated over the same intervals. Intervals with non-positive elapsed
//! time contribute nothing.

use crate::sample::DriveSample;
use serde::Serialize;

/// Instantaneous acceleration at or above this counts as a hard acceleration.
const HARD_ACCEL_MPS2: f64 = 3.0;
/// Instantaneous acceleration at or below this counts as a hard brake.
const HARD_BRAKE_MPS2: f64 = -3.0;

const MPS_PER_KMH: f64 = 1000.0 / 3600.0;

/// Snapshot of the running session totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
    /// Average economy in km/L; 0.0 when no fuel has been consumed.
    pub avg_kpl: f64,
    pub fuel_liters: f64,
    pub accel_events: u32,
    pub brake_events: u32,
    pub sample_count: u32,
}

/// Incremental session aggregator. Feed samples in timestamp order; each
/// [`add`](Self::add) returns the summary as of that sample.
#[derive(Debug, Default)]
pub struct SessionAccumulator {
    prev: Option<DriveSample>,
    distance_m: f64,
    speed_sum: u64,
    fuel_liters: f64,
    accel_events: u32,
    brake_events: u32,
    sample_count: u32,
}

impl SessionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the running totals and return the updated
    /// summary.
    pub fn add(&mut self, sample: &DriveSample) -> SessionSummary {
        self.sample_count += 1;
        self.speed_sum += u64::from(sample.speed_kmh);

        if let Some(prev) = self.prev {
            let dt = (sample.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
            if dt > 0.0 {
                let v_prev = f64::from(prev.speed_kmh) * MPS_PER_KMH;
                let v_curr = f64::from(sample.speed_kmh) * MPS_PER_KMH;
                self.distance_m += (v_prev + v_curr) / 2.0 * dt;

                let accel = (v_curr - v_prev) / dt;
                if accel >= HARD_ACCEL_MPS2 {
                    self.accel_events += 1;
                }
                if accel <= HARD_BRAKE_MPS2 {
                    self.brake_events += 1;
                }

                // km/h over km/L is L/h; scale by the interval in hours.
                if sample.instant_kpl.is_finite() && sample.instant_kpl > 0.0 {
                    self.fuel_liters +=
                        f64::from(sample.speed_kmh) / sample.instant_kpl * (dt / 3600.0);
                }
            }
        }
        self.prev = Some(*sample);
        self.summary()
    }

    /// Current totals without consuming a sample.
    pub fn summary(&self) -> SessionSummary {
        let distance_km = self.distance_m / 1000.0;
        let avg_speed_kmh = if self.sample_count > 0 {
            self.speed_sum as f64 / f64::from(self.sample_count)
        } else {
            0.0
        };
        let avg_kpl = if self.fuel_liters > 0.0 {
            distance_km / self.fuel_liters
        } else {
            0.0
        };
        SessionSummary {
            distance_km,
            avg_speed_kmh,
            avg_kpl,
            fuel_liters: self.fuel_liters,
            accel_events: self.accel_events,
            brake_events: self.brake_events,
            sample_count: self.sample_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn sample(secs: i64, speed_kmh: u32, instant_kpl: f64) -> DriveSample {
        DriveSample {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            speed_kmh,
            rpm: 0,
            instant_kpl,
        }
    }

    #[test]
    fn trapezoidal_distance_over_accelerate_then_stop() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 0, 0.0));
        acc.add(&sample(10, 36, 0.0));
        let summary = acc.add(&sample(20, 0, 0.0));
        // (0+10)/2*10 + (10+0)/2*10 = 100 m
        assert!((summary.distance_km - 0.1).abs() < 1e-9);
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.accel_events, 0);
        assert_eq!(summary.brake_events, 0);
    }

    #[test]
    fn hard_accel_counted_at_threshold() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 0, 0.0));
        // 0 -> 108 km/h (30 m/s) over 10 s is exactly 3 m/s².
        let summary = acc.add(&sample(10, 108, 0.0));
        assert_eq!(summary.accel_events, 1);
        assert_eq!(summary.brake_events, 0);
    }

    #[test]
    fn hard_brake_counted_at_threshold() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 108, 0.0));
        let summary = acc.add(&sample(10, 0, 0.0));
        assert_eq!(summary.brake_events, 1);
        assert_eq!(summary.accel_events, 0);
    }

    #[test]
    fn duplicate_timestamp_interval_is_skipped() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 50, 0.0));
        let summary = acc.add(&sample(0, 200, 0.0));
        assert_eq!(summary.distance_km, 0.0);
        assert_eq!(summary.accel_events, 0);
        assert_eq!(summary.sample_count, 2);
    }

    #[test]
    fn fuel_integrates_only_positive_finite_economy() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 36, 10.0));
        acc.add(&sample(10, 36, 0.0));
        acc.add(&sample(20, 36, f64::INFINITY));
        let summary = acc.add(&sample(30, 36, 10.0));
        // Only the first and last intervals burn fuel: 36/10 L/h * 10/3600 h each.
        let per_interval = 36.0 / 10.0 * (10.0 / 3600.0);
        assert!((summary.fuel_liters - 2.0 * per_interval).abs() < 1e-12);
    }

    #[test]
    fn average_economy_is_distance_over_fuel() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 36, 10.0));
        let summary = acc.add(&sample(10, 36, 10.0));
        // 36 km/h for 10 s = 0.1 km; fuel 3.6 L/h for 10 s = 0.01 L.
        assert!((summary.distance_km - 0.1).abs() < 1e-9);
        assert!((summary.fuel_liters - 0.01).abs() < 1e-12);
        assert!((summary.avg_kpl - 10.0).abs() < 1e-9);
    }

    #[test]
    fn average_economy_is_zero_without_fuel() {
        let mut acc = SessionAccumulator::new();
        acc.add(&sample(0, 50, 0.0));
        let summary = acc.add(&sample(10, 50, 0.0));
        assert!(summary.distance_km > 0.0);
        assert_eq!(summary.avg_kpl, 0.0);
    }

    #[test]
    fn empty_accumulator_reports_zeros() {
        let summary = SessionAccumulator::new().summary();
        assert_eq!(summary.sample_count, 0);
        assert_eq!(summary.avg_speed_kmh, 0.0);
        assert_eq!(summary.avg_kpl, 0.0);
    }

    proptest! {
        #[test]
        fn totals_never_go_negative(
            speeds in proptest::collection::vec(0u32..=250, 1..40),
            steps in proptest::collection::vec(1i64..=10, 40),
        ) {
            let mut acc = SessionAccumulator::new();
            let mut t = 0i64;
            let mut last = acc.summary();
            for (speed, step) in speeds.iter().zip(&steps) {
                t += step;
                last = acc.add(&sample(t, *speed, 12.0));
            }
            prop_assert!(last.distance_km >= 0.0);
            prop_assert!(last.fuel_liters >= 0.0);
            prop_assert!(last.avg_kpl >= 0.0);
            prop_assert_eq!(last.sample_count as usize, speeds.len());
        }
    }
}
