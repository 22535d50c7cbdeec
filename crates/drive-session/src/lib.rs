//! Drive Session Aggregation
//!
//! Consumes the stream of decoded telemetry samples for one drive and
//! incrementally computes distance, average speed, fuel use, and harsh-event
//! counts, plus MAF-based instantaneous and average fuel economy.

mod accumulator;
mod economy;
mod sample;

pub use accumulator::{SessionAccumulator, SessionSummary};
pub use economy::{instant_kpl, AverageEconomy, EconomyConfig};
pub use sample::DriveSample;
