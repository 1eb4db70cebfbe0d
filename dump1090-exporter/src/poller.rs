//! Poll scheduler — one independent task per dump1090 resource.
//!
//! Each task fetches its resource, derives a complete sample set, and swaps
//! it into the [`MetricStore`] slot for that resource. A failed poll is logged
//! and leaves the slot untouched; the next scheduled poll is the retry.
//!
//! Cadence: after each poll a task sleeps for `interval - elapsed` (floored at
//! zero). The receiver task's interval comes from its [`ReceiverTracker`]:
//! short while seeking a position, long once locked.
//!
//! The receiver task publishes the current origin on a `watch` channel that
//! the aircraft task reads before each range calculation. All tasks stop when
//! the shared [`CancellationToken`] fires, including mid-fetch and mid-sleep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use dump1090_core::range::DEFAULT_RECENT_THRESHOLD_SECS;
use dump1090_core::receiver::Transition;
use dump1090_core::stats::missing_periods;
use dump1090_core::{
    aircraft_samples, flatten_stats, parse_aircraft, parse_receiver, summarize, MetricStore,
    Position, RangeSummary, ReceiverIntervals, ReceiverTracker, Resource, TimePeriod,
};

use crate::error::PollError;
use crate::fetch::ResourceSource;

/// Cadence and derivation settings for the poll tasks.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub aircraft_interval: Duration,
    pub stats_interval: Duration,
    pub receiver_intervals: ReceiverIntervals,
    /// Static receiver position; always wins over the polled one.
    pub origin_override: Option<Position>,
    /// Stats periods to export.
    pub time_periods: Vec<TimePeriod>,
    pub recent_threshold_secs: f64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            aircraft_interval: Duration::from_secs(10),
            stats_interval: Duration::from_secs(60),
            receiver_intervals: ReceiverIntervals::default(),
            origin_override: None,
            time_periods: vec![TimePeriod::Last1Min],
            recent_threshold_secs: DEFAULT_RECENT_THRESHOLD_SECS,
        }
    }
}

/// Handles of the spawned poll tasks.
pub struct PollerTasks {
    handles: Vec<JoinHandle<()>>,
}

impl PollerTasks {
    /// Wait for every poll task to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "poll task ended abnormally");
            }
        }
    }
}

pub struct Poller {
    source: Arc<dyn ResourceSource>,
    store: Arc<MetricStore>,
    config: PollerConfig,
}

/// Sleep out the rest of `interval`. Returns false if cancelled first.
async fn pause(cancel: &CancellationToken, interval: Duration, started: Instant) -> bool {
    let remaining = interval.saturating_sub(started.elapsed());
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(remaining) => true,
    }
}

impl Poller {
    pub fn new(
        source: Arc<dyn ResourceSource>,
        store: Arc<MetricStore>,
        config: PollerConfig,
    ) -> Self {
        Poller {
            source,
            store,
            config,
        }
    }

    /// Spawn the receiver, aircraft and stats tasks.
    pub fn start(self, cancel: CancellationToken) -> PollerTasks {
        let poller = Arc::new(self);
        let (origin_tx, origin_rx) = watch::channel(poller.config.origin_override);

        let handles = vec![
            tokio::spawn(Arc::clone(&poller).receiver_loop(origin_tx, cancel.clone())),
            tokio::spawn(Arc::clone(&poller).aircraft_loop(origin_rx, cancel.clone())),
            tokio::spawn(poller.stats_loop(cancel)),
        ];
        PollerTasks { handles }
    }

    // -----------------------------------------------------------------------
    // Single polls
    // -----------------------------------------------------------------------

    /// Fetch `receiver.json`, advance the tracker, and publish receiver samples.
    pub async fn poll_receiver(
        &self,
        tracker: &mut ReceiverTracker,
    ) -> Result<Transition, PollError> {
        let doc = self.source.fetch(Resource::Receiver).await?;
        let info = parse_receiver(&doc)?;
        let transition = tracker.observe(&info);
        self.store.replace(Resource::Receiver, tracker.samples());
        Ok(transition)
    }

    /// Fetch `aircraft.json` and publish counts and range against `origin`.
    pub async fn poll_aircraft(&self, origin: Option<Position>) -> Result<RangeSummary, PollError> {
        let doc = self.source.fetch(Resource::Aircraft).await?;
        let snapshot = parse_aircraft(&doc)?;
        let summary = summarize(&snapshot, origin, self.config.recent_threshold_secs);
        self.store
            .replace(Resource::Aircraft, aircraft_samples(&snapshot, &summary));
        Ok(summary)
    }

    /// Fetch `stats.json` and publish the configured periods. Returns the sample count.
    pub async fn poll_stats(&self) -> Result<usize, PollError> {
        let doc = self.source.fetch(Resource::Stats).await?;
        let samples = flatten_stats(&doc, &self.config.time_periods)?;
        for period in missing_periods(&doc, &self.config.time_periods) {
            tracing::warn!(%period, "time period missing from stats data");
        }
        let count = samples.len();
        self.store.replace(Resource::Stats, samples);
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Loops
    // -----------------------------------------------------------------------

    async fn receiver_loop(
        self: Arc<Self>,
        origin_tx: watch::Sender<Option<Position>>,
        cancel: CancellationToken,
    ) {
        let mut tracker =
            ReceiverTracker::new(self.config.origin_override, self.config.receiver_intervals);
        if tracker.origin().is_some() {
            self.store.replace(Resource::Receiver, tracker.samples());
        }

        tracing::info!(
            location = %self.source.location(Resource::Receiver),
            interval_secs = tracker.interval().as_secs_f64(),
            origin_override = ?self.config.origin_override,
            "receiver poller started"
        );

        loop {
            let started = Instant::now();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_receiver(&mut tracker) => outcome,
            };

            match outcome {
                Ok(transition) => {
                    origin_tx.send_replace(tracker.origin());
                    if let (Transition::Locked, Some(origin)) = (transition, tracker.origin()) {
                        tracing::info!(
                            %origin,
                            interval_secs = tracker.interval().as_secs_f64(),
                            "receiver position locked"
                        );
                    }
                }
                Err(e) => tracing::warn!(
                    resource = %Resource::Receiver,
                    phase = ?tracker.phase(),
                    error = %e,
                    "poll failed"
                ),
            }

            if !pause(&cancel, tracker.interval(), started).await {
                break;
            }
        }

        tracing::info!("receiver poller stopped");
    }

    async fn aircraft_loop(
        self: Arc<Self>,
        origin_rx: watch::Receiver<Option<Position>>,
        cancel: CancellationToken,
    ) {
        tracing::info!(
            location = %self.source.location(Resource::Aircraft),
            interval_secs = self.config.aircraft_interval.as_secs_f64(),
            "aircraft poller started"
        );

        loop {
            let started = Instant::now();
            let origin = *origin_rx.borrow();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_aircraft(origin) => outcome,
            };

            match outcome {
                Ok(summary) => tracing::debug!(
                    observed = summary.observed,
                    with_position = summary.with_position,
                    with_mlat = summary.with_mlat,
                    max_range_m = ?summary.max_range_m,
                    "aircraft updated"
                ),
                Err(e) => tracing::warn!(resource = %Resource::Aircraft, error = %e, "poll failed"),
            }

            if !pause(&cancel, self.config.aircraft_interval, started).await {
                break;
            }
        }

        tracing::info!("aircraft poller stopped");
    }

    async fn stats_loop(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(
            location = %self.source.location(Resource::Stats),
            interval_secs = self.config.stats_interval.as_secs_f64(),
            periods = ?self.config.time_periods,
            "stats poller started"
        );

        loop {
            let started = Instant::now();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_stats() => outcome,
            };

            match outcome {
                Ok(samples) => tracing::debug!(samples, "stats updated"),
                Err(e) => tracing::warn!(resource = %Resource::Stats, error = %e, "poll failed"),
            }

            if !pause(&cancel, self.config.stats_interval, started).await {
                break;
            }
        }

        tracing::info!("stats poller stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use dump1090_core::{ParseError, ReceiverPhase};

    use crate::error::FetchError;

    const ADELAIDE: Position = Position {
        lat: -34.9285,
        lon: 138.6007,
    };

    #[derive(Clone)]
    enum Reply {
        Doc(Value),
        Missing,
        Garbage,
        Hang,
        /// Answer with the document after a delay.
        Slow(Duration, Value),
    }

    #[derive(Default)]
    struct MockState {
        replies: HashMap<Resource, VecDeque<Reply>>,
        calls: HashMap<Resource, usize>,
        starts: HashMap<Resource, Vec<Instant>>,
    }

    /// Scripted source. Replies are consumed in order; the last one repeats.
    #[derive(Default)]
    struct MockSource {
        state: Mutex<MockState>,
    }

    impl MockSource {
        fn push(&self, resource: Resource, reply: Reply) {
            self.state
                .lock()
                .unwrap()
                .replies
                .entry(resource)
                .or_default()
                .push_back(reply);
        }

        fn set(&self, resource: Resource, reply: Reply) {
            let mut state = self.state.lock().unwrap();
            let queue = state.replies.entry(resource).or_default();
            queue.clear();
            queue.push_back(reply);
        }

        fn calls(&self, resource: Resource) -> usize {
            self.state
                .lock()
                .unwrap()
                .calls
                .get(&resource)
                .copied()
                .unwrap_or(0)
        }

        /// Gaps between consecutive fetch start times.
        fn gaps(&self, resource: Resource) -> Vec<Duration> {
            let state = self.state.lock().unwrap();
            let starts = state.starts.get(&resource).cloned().unwrap_or_default();
            starts.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl ResourceSource for MockSource {
        async fn fetch(&self, resource: Resource) -> Result<Value, PollError> {
            let reply = {
                let mut state = self.state.lock().unwrap();
                *state.calls.entry(resource).or_default() += 1;
                state.starts.entry(resource).or_default().push(Instant::now());
                let queue = state.replies.entry(resource).or_default();
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            };

            match reply.unwrap_or(Reply::Missing) {
                Reply::Doc(doc) => Ok(doc),
                Reply::Missing => Err(FetchError::NotFound {
                    location: resource.file_name().into(),
                }
                .into()),
                Reply::Garbage => Err(ParseError::Json {
                    resource,
                    source: serde_json::from_str::<Value>("{").unwrap_err(),
                }
                .into()),
                Reply::Hang => std::future::pending().await,
                Reply::Slow(delay, doc) => {
                    tokio::time::sleep(delay).await;
                    Ok(doc)
                }
            }
        }

        fn location(&self, resource: Resource) -> String {
            format!("mock://{}", resource.file_name())
        }
    }

    fn receiver_doc() -> Value {
        json!({"version": "test", "refresh": 1000, "lat": ADELAIDE.lat, "lon": ADELAIDE.lon})
    }

    fn aircraft_doc() -> Value {
        json!({
            "now": 1700000000.0,
            "messages": 5000,
            "aircraft": [
                {"hex": "7c0001", "lat": -35.0, "lon": 138.5, "seen": 1.0, "seen_pos": 1.0},
                {"hex": "7c0002", "lat": -33.9285, "lon": 138.6007, "seen": 2.0, "seen_pos": 2.0,
                 "mlat": ["lat", "lon"]},
                {"hex": "7c0003", "lat": -37.8136, "lon": 144.9631, "seen": 0.5, "seen_pos": 3.0},
                {"hex": "7c0004", "altitude": 32000, "seen": 4.0}
            ]
        })
    }

    fn stats_doc() -> Value {
        json!({
            "latest": {"messages": 10},
            "last1min": {"messages": 1500, "local": {"accepted": [1400, 30], "noise": -32.1},
                         "tracks": {"all": 12}},
            "total": {"messages": 99999}
        })
    }

    fn make_poller(source: &Arc<MockSource>, config: PollerConfig) -> (Poller, Arc<MetricStore>) {
        let store = Arc::new(MetricStore::new());
        let source: Arc<dyn ResourceSource> = source.clone();
        (Poller::new(source, Arc::clone(&store), config), store)
    }

    fn fast_config() -> PollerConfig {
        PollerConfig {
            aircraft_interval: Duration::from_millis(20),
            stats_interval: Duration::from_millis(20),
            receiver_intervals: ReceiverIntervals {
                seeking: Duration::from_millis(20),
                locked: Duration::from_secs(3600),
            },
            ..PollerConfig::default()
        }
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn value_of(store: &MetricStore, resource: Resource, name: &str) -> Option<f64> {
        store
            .get(resource)
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value)
    }

    #[tokio::test]
    async fn test_receiver_interval_switches_exactly_once() {
        let source = Arc::new(MockSource::default());
        source.push(Resource::Receiver, Reply::Missing);
        source.push(Resource::Receiver, Reply::Doc(json!({"version": "test"})));
        source.push(Resource::Receiver, Reply::Doc(receiver_doc()));
        source.push(Resource::Receiver, Reply::Doc(receiver_doc()));
        source.push(Resource::Receiver, Reply::Garbage);
        source.push(Resource::Receiver, Reply::Doc(json!({"lat": null, "lon": null})));

        let (poller, store) = make_poller(&source, PollerConfig::default());
        let mut tracker = ReceiverTracker::new(None, ReceiverIntervals::default());

        let mut transitions = Vec::new();
        let mut intervals = Vec::new();
        for _ in 0..6 {
            let outcome = poller.poll_receiver(&mut tracker).await;
            transitions.push(outcome.ok());
            intervals.push(tracker.interval().as_secs());
        }

        assert_eq!(
            transitions,
            vec![
                None,
                Some(Transition::Unchanged),
                Some(Transition::Locked),
                Some(Transition::Unchanged),
                None,
                Some(Transition::Unchanged),
            ]
        );
        assert_eq!(intervals, vec![10, 10, 300, 300, 300, 300]);
        assert_eq!(tracker.phase(), ReceiverPhase::Locked);
        assert_eq!(
            value_of(&store, Resource::Receiver, "dump1090_receiver_latitude"),
            Some(ADELAIDE.lat)
        );
    }

    #[tokio::test]
    async fn test_error_keeps_seeking_interval() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Missing);
        let (poller, store) = make_poller(&source, PollerConfig::default());
        let mut tracker = ReceiverTracker::new(None, ReceiverIntervals::default());

        for _ in 0..3 {
            assert!(poller.poll_receiver(&mut tracker).await.is_err());
            assert_eq!(tracker.phase(), ReceiverPhase::Seeking);
            assert_eq!(tracker.interval(), Duration::from_secs(10));
        }
        assert!(store.get(Resource::Receiver).is_empty());
    }

    #[tokio::test]
    async fn test_aircraft_counts_and_range() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        let (poller, store) = make_poller(&source, PollerConfig::default());

        let summary = poller.poll_aircraft(Some(ADELAIDE)).await.unwrap();
        assert_eq!(summary.observed, 4);
        assert_eq!(summary.with_position, 3);
        assert_eq!(summary.with_mlat, 1);

        let max = value_of(&store, Resource::Aircraft, "dump1090_aircraft_recent_max_range")
            .unwrap();
        assert!(((max - 653_543.321_224_758_5) / 653_543.321_224_758_5).abs() < 1e-6);
        assert_eq!(
            value_of(&store, Resource::Aircraft, "dump1090_messages_total"),
            Some(5000.0)
        );
    }

    #[tokio::test]
    async fn test_aircraft_without_origin_omits_range() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        let (poller, store) = make_poller(&source, PollerConfig::default());

        poller.poll_aircraft(None).await.unwrap();
        assert!(value_of(&store, Resource::Aircraft, "dump1090_aircraft_recent_max_range").is_none());
        assert_eq!(
            value_of(&store, Resource::Aircraft, "dump1090_recent_aircraft_observed"),
            Some(4.0)
        );
    }

    #[tokio::test]
    async fn test_aircraft_failure_preserves_all_metrics() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Doc(receiver_doc()));
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        source.set(Resource::Stats, Reply::Doc(stats_doc()));

        let (poller, store) = make_poller(&source, PollerConfig::default());
        let mut tracker = ReceiverTracker::new(None, ReceiverIntervals::default());
        poller.poll_receiver(&mut tracker).await.unwrap();
        poller.poll_aircraft(tracker.origin()).await.unwrap();
        poller.poll_stats().await.unwrap();

        let before = store.render().unwrap();
        assert!(before.contains("dump1090_recent_aircraft_observed{time_period=\"latest\"} 4\n"));

        source.set(Resource::Aircraft, Reply::Missing);
        source.push(Resource::Aircraft, Reply::Garbage);
        source.push(Resource::Aircraft, Reply::Doc(json!({"aircraft": "not a list"})));

        assert!(matches!(
            poller.poll_aircraft(tracker.origin()).await,
            Err(PollError::Fetch(FetchError::NotFound { .. }))
        ));
        assert!(matches!(
            poller.poll_aircraft(tracker.origin()).await,
            Err(PollError::Parse(ParseError::Json { .. }))
        ));
        assert!(matches!(
            poller.poll_aircraft(tracker.origin()).await,
            Err(PollError::Parse(ParseError::Schema { .. }))
        ));

        assert_eq!(store.render().unwrap(), before);
    }

    #[tokio::test]
    async fn test_stats_exports_selected_periods() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Stats, Reply::Doc(stats_doc()));
        let config = PollerConfig {
            time_periods: vec![TimePeriod::Last1Min, TimePeriod::Total, TimePeriod::Last5Min],
            ..PollerConfig::default()
        };
        let (poller, store) = make_poller(&source, config);

        let count = poller.poll_stats().await.unwrap();
        // last1min: messages, 2x accepted, noise, tracks_all; total: messages
        assert_eq!(count, 6);

        let samples = store.get(Resource::Stats);
        assert!(samples.iter().all(|s| {
            matches!(
                s.labels.get("time_period").map(String::as_str),
                Some("last1min") | Some("total")
            )
        }));
    }

    #[tokio::test]
    async fn test_loops_exit_promptly_when_fetch_hangs() {
        let source = Arc::new(MockSource::default());
        for resource in Resource::ALL {
            source.set(resource, Reply::Hang);
        }
        let (poller, _store) = make_poller(&source, PollerConfig::default());

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());
        assert!(wait_for(|| Resource::ALL.iter().all(|r| source.calls(*r) == 1)).await);

        cancel.cancel();
        assert!(tokio::time::timeout(Duration::from_secs(1), tasks.join())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_loops_exit_promptly_while_sleeping() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Doc(receiver_doc()));
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        source.set(Resource::Stats, Reply::Doc(stats_doc()));
        let (poller, store) = make_poller(&source, PollerConfig::default());

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());
        assert!(wait_for(|| !store.get(Resource::Stats).is_empty()).await);

        cancel.cancel();
        assert!(tokio::time::timeout(Duration::from_secs(1), tasks.join())
            .await
            .is_ok());
        assert!(!store.get(Resource::Stats).is_empty());
    }

    #[tokio::test]
    async fn test_stalled_resource_does_not_block_others() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Hang);
        source.set(Resource::Aircraft, Reply::Hang);
        source.set(Resource::Stats, Reply::Doc(stats_doc()));
        let (poller, store) = make_poller(&source, fast_config());

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());

        assert!(wait_for(|| source.calls(Resource::Stats) >= 3).await);
        assert!(!store.get(Resource::Stats).is_empty());
        assert_eq!(source.calls(Resource::Aircraft), 1);
        assert!(store.get(Resource::Aircraft).is_empty());

        cancel.cancel();
        tasks.join().await;
    }

    #[tokio::test]
    async fn test_override_origin_used_when_receiver_unreachable() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Missing);
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        let config = PollerConfig {
            origin_override: Some(ADELAIDE),
            ..fast_config()
        };
        let (poller, store) = make_poller(&source, config);

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());

        assert!(wait_for(|| {
            value_of(&store, Resource::Aircraft, "dump1090_aircraft_recent_max_range").is_some()
        })
        .await);
        assert_eq!(
            value_of(&store, Resource::Receiver, "dump1090_receiver_longitude"),
            Some(ADELAIDE.lon)
        );

        cancel.cancel();
        tasks.join().await;
    }

    #[tokio::test]
    async fn test_polled_origin_reaches_aircraft_task() {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Doc(receiver_doc()));
        source.set(Resource::Aircraft, Reply::Doc(aircraft_doc()));
        let (poller, store) = make_poller(&source, fast_config());

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());

        assert!(wait_for(|| {
            value_of(&store, Resource::Aircraft, "dump1090_aircraft_recent_max_range").is_some()
        })
        .await);

        // Locked: the receiver is not polled again within the long interval.
        let receiver_calls = source.calls(Resource::Receiver);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(Resource::Receiver), receiver_calls);

        cancel.cancel();
        tasks.join().await;
    }

    fn stats_only(stats_interval: Duration, reply: Reply) -> (Arc<MockSource>, Poller) {
        let source = Arc::new(MockSource::default());
        source.set(Resource::Receiver, Reply::Hang);
        source.set(Resource::Aircraft, Reply::Hang);
        source.set(Resource::Stats, reply);
        let config = PollerConfig {
            stats_interval,
            ..PollerConfig::default()
        };
        let (poller, _store) = make_poller(&source, config);
        (source, poller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_polls_again_without_sleeping() {
        let (source, poller) = stats_only(
            Duration::from_millis(100),
            Reply::Slow(Duration::from_millis(250), stats_doc()),
        );

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());
        assert!(wait_for(|| source.calls(Resource::Stats) >= 4).await);
        cancel.cancel();
        tasks.join().await;

        // Each fetch overruns the interval, so the next one starts as soon as
        // the previous one returns.
        let gaps = source.gaps(Resource::Stats);
        assert!(gaps.len() >= 3);
        for gap in gaps {
            assert!(gap >= Duration::from_millis(250), "gap {gap:?}");
            assert!(gap < Duration::from_millis(253), "gap {gap:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_cadence_subtracts_fetch_time() {
        let (source, poller) = stats_only(
            Duration::from_millis(100),
            Reply::Slow(Duration::from_millis(30), stats_doc()),
        );

        let cancel = CancellationToken::new();
        let tasks = poller.start(cancel.clone());
        assert!(wait_for(|| source.calls(Resource::Stats) >= 4).await);
        cancel.cancel();
        tasks.join().await;

        // Polls land on the interval boundary, not interval + fetch time.
        let gaps = source.gaps(Resource::Stats);
        assert!(gaps.len() >= 3);
        for gap in gaps {
            assert!(gap >= Duration::from_millis(100), "gap {gap:?}");
            assert!(gap < Duration::from_millis(103), "gap {gap:?}");
        }
    }
}
