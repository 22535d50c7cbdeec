//! Polling Scheduler
//!
//! Owns the single poll loop. Consumers register the signals they need under
//! a [`PollSource`]; the scheduler merges all sources into one subscription
//! set, batches it onto the transport every poll period, and broadcasts the
//! decoded samples. The loop runs while at least one source is registered
//! and is torn down when the last one withdraws.

use crate::subscription::SubscriptionSet;
use crate::transport::{Transport, TransportError};
use chrono::{DateTime, Utc};
use obd_protocol::{mode01, mode22, BatchError, DecodeError, Mode, SignalId, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Scheduler tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay between poll cycles, in milliseconds.
    pub poll_period_ms: u64,
    /// Per-request transport timeout, in milliseconds.
    pub query_timeout_ms: u64,
    /// Capacity of the broadcast channel carrying decoded samples.
    pub sample_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 500,
            query_timeout_ms: 1000,
            sample_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Who is asking for signals. Each source holds its subscriptions
/// independently; the poll loop serves the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollSource {
    /// Live gauge display.
    Dashboard,
    /// Trip recorder.
    Recorder,
    /// Background service.
    Service,
}

/// One decoded signal reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub signal: SignalId,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

/// Errors surfaced by one-shot queries. The poll loop itself never returns
/// these; it logs and moves on to the next cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The response parsed but did not answer for the requested signal.
    #[error("response did not include {signal:?}")]
    MissingSignal { signal: SignalId },
}

struct Inner {
    sources: HashMap<PollSource, Vec<SignalId>>,
    task: Option<JoinHandle<()>>,
}

/// Subscription-driven poll loop over a [`Transport`].
pub struct PollScheduler<T: Transport + 'static> {
    transport: Arc<T>,
    config: SchedulerConfig,
    subs: watch::Sender<SubscriptionSet>,
    paused: watch::Sender<bool>,
    sample_tx: broadcast::Sender<Sample>,
    inner: Mutex<Inner>,
}

impl<T: Transport + 'static> PollScheduler<T> {
    pub fn new(transport: T, config: SchedulerConfig) -> Self {
        let (subs, _) = watch::channel(SubscriptionSet::new());
        let (paused, _) = watch::channel(false);
        let (sample_tx, _) = broadcast::channel(config.sample_capacity);
        Self {
            transport: Arc::new(transport),
            config,
            subs,
            paused,
            sample_tx,
            inner: Mutex::new(Inner {
                sources: HashMap::new(),
                task: None,
            }),
        }
    }

    /// Subscribe `source` to `signals` and make sure the poll loop is
    /// running. Registering an already-registered source is a no-op, so the
    /// loop is never started twice.
    pub fn register(&self, source: PollSource, signals: &[SignalId]) {
        let mut inner = self.lock();
        if inner.sources.contains_key(&source) {
            debug!(?source, "source already registered");
            return;
        }
        inner.sources.insert(source, signals.to_vec());
        self.subs.send_modify(|set| {
            for &signal in signals {
                set.register(signal);
            }
        });
        self.paused.send_replace(false);
        self.spawn_if_idle(&mut inner);
    }

    /// Drop `source` and its subscriptions. When the last source withdraws
    /// the poll loop stops.
    pub fn withdraw(&self, source: PollSource) {
        let mut inner = self.lock();
        let Some(signals) = inner.sources.remove(&source) else {
            return;
        };
        self.subs.send_modify(|set| {
            for signal in signals {
                set.withdraw(signal);
            }
        });
        if inner.sources.is_empty() {
            if let Some(task) = inner.task.take() {
                task.abort();
            }
        }
    }

    /// Suspend polling without forgetting any subscriptions. Cooperative:
    /// the loop checks the flag between batches and between cycles, so a
    /// request already on the bus runs to completion rather than being
    /// abandoned mid-flight.
    pub fn pause(&self) {
        let inner = self.lock();
        if inner.task.is_some() {
            self.paused.send_replace(true);
        }
    }

    /// Resume polling after [`pause`](Self::pause). A no-op when no sources
    /// are registered.
    pub fn resume(&self) {
        let inner = self.lock();
        if inner.task.is_some() {
            self.paused.send_replace(false);
        }
    }

    /// Whether the poll loop is currently running and not paused.
    pub fn is_polling(&self) -> bool {
        self.lock().task.is_some() && !*self.paused.borrow()
    }

    /// Subscribe to the decoded sample stream.
    pub fn samples(&self) -> broadcast::Receiver<Sample> {
        self.sample_tx.subscribe()
    }

    /// One-shot query for a single signal, outside the poll cycle.
    pub async fn query_single(&self, signal: SignalId) -> Result<Value, PollError> {
        let cmd = match signal.mode() {
            Mode::Mode01 => mode01::build_command(&[signal])?,
            Mode::Mode22 => mode22::build_command(&[signal])?,
        };
        let response = self
            .transport
            .query(&cmd, Some(signal.header()), self.config.query_timeout())
            .await?;
        let mut values = match signal.mode() {
            Mode::Mode01 => mode01::parse_response(&response)?,
            Mode::Mode22 => mode22::parse_response(&response)?,
        };
        values
            .remove(&signal)
            .ok_or(PollError::MissingSignal { signal })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_if_idle(&self, inner: &mut Inner) {
        if inner.task.is_some() {
            return;
        }
        let transport = Arc::clone(&self.transport);
        let config = self.config.clone();
        let subs_rx = self.subs.subscribe();
        let paused_rx = self.paused.subscribe();
        let sample_tx = self.sample_tx.clone();
        inner.task = Some(tokio::spawn(poll_loop(
            transport, config, subs_rx, paused_rx, sample_tx,
        )));
    }
}

impl<T: Transport + 'static> Drop for PollScheduler<T> {
    fn drop(&mut self) {
        if let Some(task) = self.lock().task.take() {
            task.abort();
        }
    }
}

/// One transport round-trip's worth of signals: a Mode 01 batch for a single
/// ECU header, or a lone Mode 22 request.
struct Batch {
    mode: Mode,
    header: &'static str,
    signals: Vec<SignalId>,
}

/// Split the subscription snapshot into transport batches. Mode 01 signals
/// are grouped per ECU header and chunked to the batch limit; Mode 22
/// signals go one per request.
fn partition(snapshot: &[SignalId]) -> Vec<Batch> {
    let mut by_header: BTreeMap<&'static str, Vec<SignalId>> = BTreeMap::new();
    let mut extended = Vec::new();
    for &signal in snapshot {
        match signal.mode() {
            Mode::Mode01 => by_header.entry(signal.header()).or_default().push(signal),
            Mode::Mode22 => extended.push(signal),
        }
    }
    let mut batches = Vec::new();
    for (header, signals) in by_header {
        for chunk in signals.chunks(mode01::MAX_PIDS) {
            batches.push(Batch {
                mode: Mode::Mode01,
                header,
                signals: chunk.to_vec(),
            });
        }
    }
    for signal in extended {
        batches.push(Batch {
            mode: Mode::Mode22,
            header: signal.header(),
            signals: vec![signal],
        });
    }
    batches
}

async fn poll_loop<T: Transport>(
    transport: Arc<T>,
    config: SchedulerConfig,
    subs_rx: watch::Receiver<SubscriptionSet>,
    mut paused_rx: watch::Receiver<bool>,
    sample_tx: broadcast::Sender<Sample>,
) {
    loop {
        if paused_rx.wait_for(|paused| !*paused).await.is_err() {
            return;
        }
        let snapshot = subs_rx.borrow().snapshot();
        for batch in partition(&snapshot) {
            // pause is honored between batches, never mid-request
            if *paused_rx.borrow() {
                break;
            }
            if let Err(error) = run_batch(&*transport, &config, &batch, &sample_tx).await {
                warn!(%error, header = batch.header, "poll batch failed");
            }
        }
        tokio::time::sleep(config.poll_period()).await;
    }
}

async fn run_batch<T: Transport>(
    transport: &T,
    config: &SchedulerConfig,
    batch: &Batch,
    sample_tx: &broadcast::Sender<Sample>,
) -> Result<(), PollError> {
    let cmd = match batch.mode {
        Mode::Mode01 => mode01::build_command(&batch.signals)?,
        Mode::Mode22 => mode22::build_command(&batch.signals)?,
    };
    let response = transport
        .query(&cmd, Some(batch.header), config.query_timeout())
        .await?;
    let values = match batch.mode {
        Mode::Mode01 => mode01::parse_response(&response)?,
        Mode::Mode22 => mode22::parse_response(&response)?,
    };
    let timestamp = Utc::now();
    for (signal, value) in values {
        // Send only fails when nobody is listening, which is fine.
        let _ = sample_tx.send(Sample {
            signal,
            value,
            timestamp,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            poll_period_ms: 5,
            query_timeout_ms: 50,
            sample_capacity: 64,
        }
    }

    #[tokio::test]
    async fn polls_and_broadcasts_decoded_samples() {
        let transport = MockTransport::new();
        transport.stub("01 0C 0D", "41 0C 1A F8 0D 28");
        let scheduler = PollScheduler::new(transport, fast_config());
        let mut rx = scheduler.samples();

        scheduler.register(PollSource::Dashboard, &[SignalId::Rpm, SignalId::Speed]);

        let mut seen = HashMap::new();
        while seen.len() < 2 {
            let sample = rx.recv().await.unwrap();
            seen.insert(sample.signal, sample.value);
        }
        assert_eq!(seen[&SignalId::Rpm], Value::Int(0x1AF8 / 4));
        assert_eq!(seen[&SignalId::Speed], Value::Int(0x28));
    }

    #[tokio::test]
    async fn duplicate_register_keeps_single_loop() {
        let transport = MockTransport::new();
        transport.stub("01 0D", "41 0D 00");
        let scheduler = PollScheduler::new(transport, fast_config());

        scheduler.register(PollSource::Dashboard, &[SignalId::Speed]);
        scheduler.register(PollSource::Dashboard, &[SignalId::Speed]);
        assert!(scheduler.is_polling());

        scheduler.withdraw(PollSource::Dashboard);
        assert!(!scheduler.is_polling());
    }

    #[tokio::test]
    async fn loop_survives_until_last_source_withdraws() {
        let transport = MockTransport::new();
        transport.stub("01 0D", "41 0D 37");
        let scheduler = PollScheduler::new(transport, fast_config());

        scheduler.register(PollSource::Dashboard, &[SignalId::Speed]);
        scheduler.register(PollSource::Recorder, &[SignalId::Speed]);
        scheduler.withdraw(PollSource::Dashboard);
        assert!(scheduler.is_polling());
        scheduler.withdraw(PollSource::Recorder);
        assert!(!scheduler.is_polling());
    }

    #[tokio::test]
    async fn withdrawal_stops_transport_traffic() {
        let transport = Arc::new(MockTransport::new());
        transport.stub("01 0D", "41 0D 00");
        let scheduler = PollScheduler::new(SharedMock(Arc::clone(&transport)), fast_config());

        scheduler.register(PollSource::Service, &[SignalId::Speed]);
        tokio::time::sleep(Duration::from_millis(30)).await;
        scheduler.withdraw(PollSource::Service);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let settled = transport.calls();
        assert!(settled > 0);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(transport.calls(), settled);
    }

    #[tokio::test]
    async fn pause_and_resume_toggle_the_loop() {
        let transport = MockTransport::new();
        transport.stub("01 0C", "41 0C 0B B8");
        let scheduler = PollScheduler::new(transport, fast_config());

        scheduler.register(PollSource::Dashboard, &[SignalId::Rpm]);
        assert!(scheduler.is_polling());
        scheduler.pause();
        assert!(!scheduler.is_polling());
        scheduler.resume();
        assert!(scheduler.is_polling());

        let mut rx = scheduler.samples();
        let sample = rx.recv().await.unwrap();
        assert_eq!(sample.signal, SignalId::Rpm);
    }

    #[tokio::test]
    async fn pause_lets_inflight_request_finish() {
        let counts = Arc::new(QueryCounts::default());
        let scheduler = PollScheduler::new(SlowTransport(Arc::clone(&counts)), fast_config());

        scheduler.register(PollSource::Dashboard, &[SignalId::Speed]);
        // let the first query get onto the bus, then pause mid-flight
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.pause();
        assert!(!scheduler.is_polling());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let started = counts.started.load(Ordering::SeqCst);
        assert!(started > 0);
        assert_eq!(counts.completed.load(Ordering::SeqCst), started);

        // and no further batches go out while paused
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counts.started.load(Ordering::SeqCst), started);
    }

    #[tokio::test]
    async fn resume_without_sources_stays_idle() {
        let transport = MockTransport::new();
        let scheduler = PollScheduler::new(transport, fast_config());
        scheduler.resume();
        assert!(!scheduler.is_polling());
    }

    #[tokio::test]
    async fn query_single_decodes_one_signal() {
        let transport = MockTransport::new();
        transport.stub("01 05", "41 05 7B");
        let scheduler = PollScheduler::new(transport, fast_config());
        let value = scheduler.query_single(SignalId::CoolantTemp).await.unwrap();
        assert_eq!(value, Value::Int(0x7B - 40));
    }

    #[tokio::test]
    async fn query_single_surfaces_timeouts() {
        let transport = MockTransport::new();
        let scheduler = PollScheduler::new(transport, fast_config());
        let err = scheduler.query_single(SignalId::Speed).await.unwrap_err();
        assert!(matches!(err, PollError::Transport(TransportError::Timeout { .. })));
    }

    #[test]
    fn partition_groups_mode01_by_header_and_isolates_mode22() {
        let snapshot = vec![
            SignalId::Rpm,
            SignalId::Speed,
            SignalId::CoolantTemp,
            SignalId::OilTemp,
            SignalId::CurrentGear,
        ];
        let batches = partition(&snapshot);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].mode, Mode::Mode01);
        assert_eq!(batches[0].header, "7E0");
        assert_eq!(batches[0].signals.len(), 3);
        assert!(batches[1..]
            .iter()
            .all(|b| b.mode == Mode::Mode22 && b.signals.len() == 1));
    }

    #[test]
    fn partition_chunks_large_mode01_groups() {
        let snapshot: Vec<SignalId> = SignalId::ALL
            .iter()
            .copied()
            .filter(|s| s.mode() == Mode::Mode01)
            .collect();
        let batches = partition(&snapshot);
        assert!(batches.iter().all(|b| b.signals.len() <= mode01::MAX_PIDS));
        let total: usize = batches.iter().map(|b| b.signals.len()).sum();
        assert_eq!(total, snapshot.len());
    }

    #[derive(Default)]
    struct QueryCounts {
        started: AtomicUsize,
        completed: AtomicUsize,
    }

    /// Transport whose queries take 100 ms, counting starts and completions
    /// separately so a test can tell an abandoned request from a finished one.
    struct SlowTransport(Arc<QueryCounts>);

    impl Transport for SlowTransport {
        fn query(
            &self,
            _cmd: &str,
            _header: Option<&str>,
            _timeout: Duration,
        ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send {
            self.0.started.fetch_add(1, Ordering::SeqCst);
            let counts = Arc::clone(&self.0);
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                counts.completed.fetch_add(1, Ordering::SeqCst);
                Ok("41 0D 28".to_string())
            }
        }
    }

    /// Arc wrapper so a test can keep inspecting the mock after handing it
    /// to the scheduler.
    struct SharedMock(Arc<MockTransport>);

    impl Transport for SharedMock {
        fn query(
            &self,
            cmd: &str,
            header: Option<&str>,
            timeout: Duration,
        ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send {
            self.0.query(cmd, header, timeout)
        }
    }
}
