//! Signal Subscription Set
//!
//! Reference-counted set of signals the scheduler should keep fresh. Several
//! consumers may want the same signal; it leaves the set only when the last
//! of them withdraws.

use obd_protocol::SignalId;
use std::collections::BTreeMap;

/// Refcounted subscription set. Ordered so snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    counts: BTreeMap<SignalId, usize>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference to `signal`.
    pub fn register(&mut self, signal: SignalId) {
        *self.counts.entry(signal).or_insert(0) += 1;
    }

    /// Drop one reference to `signal`; it is removed when the count hits zero.
    /// Withdrawing a signal that was never registered is a no-op.
    pub fn withdraw(&mut self, signal: SignalId) {
        if let Some(count) = self.counts.get_mut(&signal) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&signal);
            }
        }
    }

    /// Replace the whole set from configuration: every existing reference is
    /// dropped and each yielded signal is registered anew.
    pub fn replace<I>(&mut self, signals: I)
    where
        I: IntoIterator<Item = SignalId>,
    {
        self.counts.clear();
        for signal in signals {
            self.register(signal);
        }
    }

    /// The distinct signals currently referenced, in catalog order.
    pub fn snapshot(&self) -> Vec<SignalId> {
        self.counts.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct signals (not references).
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}
