//! Polling Scheduler for Vehicle Telemetry
//!
//! Keeps the active subscription set fresh by batching signal requests onto
//! a single half-duplex transport channel at a fixed cadence, with
//! pause/resume and multi-source reference counting.

mod scheduler;
mod subscription;
mod transport;

pub use scheduler::{PollError, PollScheduler, PollSource, Sample, SchedulerConfig};
pub use subscription::SubscriptionSet;
pub use transport::{MockTransport, Transport, TransportError};
