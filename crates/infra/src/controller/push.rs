//! Push controller
//!
//! Drives periodic collection and export under remotely managed schedules.
//! Two tasks run while started:
//! - the configuration notifier, polling the service and publishing on a
//!   monitor channel
//! - the collection loop, which waits for the first configuration, then
//!   multiplexes shutdown, new configurations, notifier errors and ticks,
//!   handling exactly one per iteration
//!
//! A tick locks the processor, builds the due rule at `clock.now()`, runs
//! the accumulator and then finishes the round and exports it. Collection
//! and export share one deadline. Runtime failures go to the error handler
//! and never stop the loop.
//!
//! Ticks sit on a grid anchored at the start instant: with tick period `p`
//! they fire at `start + k * p`. A period change moves to the new grid at
//! the first point not before the change, so instruments whose periods
//! now coincide are collected together. A tick already due when a new
//! configuration is dequeued runs before the configuration is applied.

use std::future::pending;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dynmetric_common::{Clock, ErrorHandler};
use dynmetric_core::{
    shared_processor, Accumulator, Exporter, Processor, ScheduleResolver, SharedProcessor,
};
use dynmetric_domain::constants::{FALLBACK_TIMEOUT, STOP_JOIN_TIMEOUT};
use dynmetric_domain::{DynMetricError, MetricConfig, Resource, Result};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ControllerError, ControllerResult};
use super::options::PushControllerOptions;
use crate::config_service::{ConfigNotifier, MonitorChannel, MonitorReceiver};
use crate::observability::log_metric;
use crate::observability::metrics::ControllerMetrics;

/// State shared between the controller handle and its collection loop
struct Shared {
    resolver: ScheduleResolver,
    accumulator: Arc<dyn Accumulator>,
    processor: SharedProcessor,
    exporter: Arc<dyn Exporter>,
    resource: Resource,
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    metrics: Arc<ControllerMetrics>,
    running: AtomicBool,
}

/// Handles of a started controller
struct Running {
    shutdown: CancellationToken,
    quit: CancellationToken,
    collection_task: JoinHandle<()>,
    notifier_task: JoinHandle<()>,
}

/// Periodic collect-and-export driver with remotely managed schedules
pub struct PushController {
    shared: Arc<Shared>,
    notifier: ConfigNotifier,
    running: Mutex<Option<Running>>,
}

impl PushController {
    /// Build a stopped controller.
    ///
    /// The processor is owned by the controller; outside readers reach it
    /// through [`processor`](Self::processor) and contend on the same lock as
    /// ticks do.
    pub fn new(
        accumulator: Arc<dyn Accumulator>,
        processor: impl Processor + 'static,
        exporter: Arc<dyn Exporter>,
        options: PushControllerOptions,
    ) -> Self {
        let notifier = ConfigNotifier::new(
            options.config_host.clone(),
            options.resource.clone(),
            options.connector_or_default(),
        )
        .with_poll_interval(options.poll_interval)
        .with_clock(Arc::clone(&options.clock));

        let shared = Shared {
            resolver: ScheduleResolver::new(),
            accumulator,
            processor: shared_processor(processor),
            exporter,
            resource: options.resource,
            clock: options.clock,
            timeout: options.timeout,
            error_handler: options.error_handler,
            metrics: Arc::new(ControllerMetrics::new()),
            running: AtomicBool::new(false),
        };

        Self { shared: Arc::new(shared), notifier, running: Mutex::new(None) }
    }

    /// Start the notifier and the collection loop.
    ///
    /// Calling `start` on a running controller is a no-op.
    ///
    /// # Errors
    /// [`ControllerError::TransportUnavailable`] when the configuration
    /// transport cannot be created. The controller stays stopped.
    #[instrument(skip(self), fields(host = %self.notifier.host()))]
    pub async fn start(&self) -> ControllerResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("push controller already running");
            return Ok(());
        }

        let reader = self.notifier.connect().await.map_err(ControllerError::TransportUnavailable)?;
        let origin = Instant::now();
        self.shared.resolver.mark_start(self.shared.clock.now());

        let (sender, receiver) = MonitorChannel::new().split();
        let quit = receiver.quit_token();
        let shutdown = CancellationToken::new();

        let notifier = self.notifier.clone();
        let notifier_task = tokio::spawn(async move { notifier.run_with(reader, sender).await });

        let shared = Arc::clone(&self.shared);
        let collection_shutdown = shutdown.clone();
        let collection_task =
            tokio::spawn(async move { collection_loop(shared, receiver, collection_shutdown, origin).await });

        *running = Some(Running { shutdown, quit, collection_task, notifier_task });
        self.shared.running.store(true, Ordering::SeqCst);
        info!("push controller started");
        Ok(())
    }

    /// Stop both tasks, then run one last collection and export.
    ///
    /// Calling `stop` on a stopped controller is a no-op. No tick begins
    /// after this returns.
    ///
    /// # Errors
    /// [`ControllerError::JoinFailed`] or [`ControllerError::Timeout`] when a
    /// background task did not end cleanly. The final export is attempted in
    /// either case.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> ControllerResult<()> {
        let mut running = self.running.lock().await;
        let Some(handles) = running.take() else {
            debug!("push controller not running");
            return Ok(());
        };

        info!("stopping push controller");
        handles.quit.cancel();
        handles.shutdown.cancel();

        let join_timeout = self.shared.tick_timeout() + STOP_JOIN_TIMEOUT;
        let collection = join_task(handles.collection_task, join_timeout).await;
        let notifier = join_task(handles.notifier_task, join_timeout).await;

        self.shared.drain().await;
        self.shared.running.store(false, Ordering::SeqCst);
        drop(running);

        info!("push controller stopped");
        collection.and(notifier)
    }

    /// Whether the controller is started and its collection loop is alive.
    ///
    /// Stays `true` through the final drain of `stop`; turns `false` early
    /// if the loop aborted on an invariant violation.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn processor(&self) -> SharedProcessor {
        Arc::clone(&self.shared.processor)
    }

    pub fn metrics(&self) -> Arc<ControllerMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    pub fn notifier_metrics(&self) -> Arc<crate::observability::metrics::PollMetrics> {
        self.notifier.metrics()
    }

    pub fn resolver(&self) -> &ScheduleResolver {
        &self.shared.resolver
    }
}

impl Drop for PushController {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.try_lock() {
            if let Some(handles) = running.take() {
                handles.quit.cancel();
                handles.shutdown.cancel();
            }
        }
    }
}

impl std::fmt::Debug for PushController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushController")
            .field("notifier", &self.notifier)
            .field("resource", &self.shared.resource)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn join_task(handle: JoinHandle<()>, limit: Duration) -> ControllerResult<()> {
    let abort = handle.abort_handle();
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ControllerError::JoinFailed(err.to_string())),
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "background task did not stop in time");
            abort.abort();
            Err(ControllerError::Timeout(limit))
        }
    }
}

async fn collection_loop(
    shared: Arc<Shared>,
    mut monitor: MonitorReceiver,
    shutdown: CancellationToken,
    origin: Instant,
) {
    let mut ticker: Option<CollectionTicker> = None;

    // No tick period exists before the first configuration.
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => return,
            Some(config) = monitor.data.recv() => {
                if shared.apply(config, origin, &mut ticker) {
                    break;
                }
            }
            Some(err) = monitor.err.recv() => shared.report(&err),
        }
    }

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            Some(config) = monitor.data.recv() => {
                if ticker.as_ref().is_some_and(|t| t.is_due(Instant::now())) {
                    if let Err(err) = shared.fire(&mut ticker).await {
                        shared.abort(&err);
                        break;
                    }
                }
                shared.apply(config, origin, &mut ticker);
            }
            Some(err) = monitor.err.recv() => shared.report(&err),
            () = next_tick(ticker.as_ref()) => {
                if let Err(err) = shared.fire(&mut ticker).await {
                    shared.abort(&err);
                    break;
                }
            }
        }
    }
    debug!("collection loop finished");
}

async fn next_tick(ticker: Option<&CollectionTicker>) {
    match ticker {
        Some(ticker) => tokio::time::sleep_until(ticker.next).await,
        None => pending::<()>().await,
    }
}

/// Tick schedule on the grid `origin + k * period`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollectionTicker {
    period: Duration,
    next: Instant,
}

impl CollectionTicker {
    /// First grid point at or after `now`, never the origin itself.
    fn aligned(origin: Instant, period: Duration, now: Instant) -> Self {
        let elapsed = now.saturating_duration_since(origin).as_nanos();
        let steps = elapsed.div_ceil(period.as_nanos().max(1)).max(1);
        let steps = u32::try_from(steps).unwrap_or(u32::MAX);
        Self { period, next: origin + period.saturating_mul(steps) }
    }

    fn is_due(&self, now: Instant) -> bool {
        self.next <= now
    }

    /// Move past `now`, skipping grid points missed by a slow tick.
    fn advance(&mut self, now: Instant) {
        while self.next <= now {
            self.next += self.period;
        }
    }
}

impl Shared {
    /// Apply a new configuration. Returns `false` if it was rejected.
    fn apply(&self, config: MetricConfig, origin: Instant, ticker: &mut Option<CollectionTicker>) -> bool {
        let fingerprint = config.fingerprint;
        let next = match self.resolver.apply_schedules(config.schedules) {
            Ok(next) => next,
            Err(err) => {
                warn!(error = %err, "rejected configuration");
                self.report(&err);
                return false;
            }
        };
        log_metric(self.metrics.record_reconfiguration(), "controller.reconfigure");

        let current = ticker.as_ref().map_or(Duration::ZERO, |t| t.period);
        if next != current {
            info!(
                ?fingerprint,
                from_secs = current.as_secs(),
                to_secs = next.as_secs(),
                "tick period changed"
            );
            *ticker = (!next.is_zero()).then(|| CollectionTicker::aligned(origin, next, Instant::now()));
        } else {
            debug!(?fingerprint, "configuration applied");
        }
        true
    }

    /// Run one tick and move the ticker past it.
    async fn fire(&self, ticker: &mut Option<CollectionTicker>) -> Result<()> {
        let outcome = self.tick().await;
        if let Some(ticker) = ticker.as_mut() {
            ticker.advance(Instant::now());
        }
        outcome
    }

    fn abort(&self, err: &DynMetricError) {
        error!(error = %err, "collection loop aborted");
        self.report(err);
        self.running.store(false, Ordering::SeqCst);
    }

    /// One collect-and-export round.
    ///
    /// # Errors
    /// Only `DynMetricError::InvariantViolation`; every runtime failure is
    /// reported and swallowed.
    async fn tick(&self) -> Result<()> {
        log_metric(self.metrics.record_tick(), "controller.tick");

        let mut processor = self.processor.lock().await;
        processor.start_collection();
        let rule = self.resolver.build_rule(self.clock.now())?;

        let budget = self.tick_timeout();
        let deadline = Instant::now() + budget;

        let collected = tokio::time::timeout_at(deadline, self.accumulator.collect(&rule, &mut **processor)).await;
        match collected {
            Ok(collected) => debug!(collected, "collection finished"),
            Err(_) => {
                // nothing from this round is exported, so nothing counts as collected
                rule.revert();
                warn!(timeout_ms = budget.as_millis() as u64, "collection timed out");
                log_metric(self.metrics.record_timeout(), "controller.collect.timeout");
                self.report(&DynMetricError::Timeout(budget));
                return Ok(());
            }
        }

        self.finish_and_export(&mut **processor, deadline, budget).await;
        Ok(())
    }

    /// Final round on stop.
    async fn drain(&self) {
        if self.resolver.has_schedules() {
            if let Err(err) = self.tick().await {
                self.report(&err);
            }
            return;
        }

        warn!("stopping before any configuration arrived; exporting an empty round");
        let budget = self.tick_timeout();
        let mut processor = self.processor.lock().await;
        processor.start_collection();
        self.finish_and_export(&mut **processor, Instant::now() + budget, budget).await;
    }

    async fn finish_and_export(&self, processor: &mut dyn Processor, deadline: Instant, budget: Duration) {
        if let Err(err) = processor.finish_collection() {
            warn!(error = %err, "failed to finish collection");
            log_metric(self.metrics.record_collection_error(), "controller.finish.error");
            self.report(&err);
        }

        let checkpoint = processor.checkpoint_set();
        let export = self.exporter.export(&self.resource, checkpoint);
        match tokio::time::timeout_at(deadline, export).await {
            Ok(Ok(())) => {
                debug!(instruments = checkpoint.len(), "exported");
                log_metric(self.metrics.record_export(checkpoint.len()), "controller.export");
            }
            Ok(Err(err)) => {
                warn!(error = %err, "export failed");
                log_metric(self.metrics.record_export_error(), "controller.export.error");
                self.report(&err);
            }
            Err(_) => {
                warn!(timeout_ms = budget.as_millis() as u64, "export timed out");
                log_metric(self.metrics.record_timeout(), "controller.export.timeout");
                self.report(&DynMetricError::Timeout(budget));
            }
        }
    }

    fn tick_timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| {
            let period = self.resolver.tick_period();
            if period.is_zero() {
                FALLBACK_TIMEOUT
            } else {
                period
            }
        })
    }

    fn report(&self, err: &DynMetricError) {
        match &self.error_handler {
            Some(handler) => handler.handle(err),
            None => dynmetric_common::handle(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use dynmetric_common::RecordingErrorHandler;
    use dynmetric_core::testing::{MockAccumulator, MockConfigTransport, MockConnector, RecordingExporter};
    use dynmetric_core::BasicProcessor;
    use dynmetric_domain::{ConfigResponse, Pattern, Schedule};

    use super::*;

    struct Harness {
        controller: PushController,
        accumulator: MockAccumulator,
        exporter: RecordingExporter,
        transport: MockConfigTransport,
        errors: Arc<RecordingErrorHandler>,
    }

    fn harness(names: &[&str], configure: impl FnOnce(PushControllerOptions) -> PushControllerOptions) -> Harness {
        let accumulator = MockAccumulator::new(names.iter().copied());
        let exporter = RecordingExporter::new();
        let transport = MockConfigTransport::new();
        let errors = Arc::new(RecordingErrorHandler::new());

        let options = PushControllerOptions::new("mock://config")
            .with_connector(Arc::new(MockConnector::new(transport.clone())))
            .with_error_handler(errors.clone())
            .with_poll_interval(Duration::from_secs(3600));

        let controller = PushController::new(
            Arc::new(accumulator.clone()),
            BasicProcessor::new(),
            Arc::new(exporter.clone()),
            configure(options),
        );
        Harness { controller, accumulator, exporter, transport, errors }
    }

    fn every(period: i32) -> ConfigResponse {
        ConfigResponse::new("v1", vec![Schedule::new(vec![Pattern::any()], period)])
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_schedule_period() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(every(10));

        h.controller.start().await.unwrap();
        settle().await;
        assert!(h.controller.is_running());

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(h.exporter.export_count(), 3);
        assert!(h.exporter.exports().iter().all(|set| set.names() == vec!["cpu"]));
        assert_eq!(h.controller.metrics().exports(), 3);

        h.controller.stop().await.unwrap();
        assert!(!h.controller.is_running());
        assert!(h.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(every(10));

        h.controller.start().await.unwrap();
        h.controller.start().await.unwrap();
        settle().await;
        assert_eq!(h.transport.fetch_count(), 1);

        h.controller.stop().await.unwrap();
        h.controller.stop().await.unwrap();
        assert_eq!(h.exporter.export_count(), 1, "only the final drain exports");
        assert!(h.transport.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn start_fails_when_transport_unavailable() {
        let accumulator = MockAccumulator::new(["cpu"]);
        let options = PushControllerOptions::new("mock://config").with_connector(Arc::new(
            MockConnector::failing(DynMetricError::Config("bad host".into())),
        ));
        let controller = PushController::new(
            Arc::new(accumulator),
            BasicProcessor::new(),
            Arc::new(RecordingExporter::new()),
            options,
        );

        let err = controller.start().await.unwrap_err();
        assert!(matches!(err, ControllerError::TransportUnavailable(DynMetricError::Config(_))));
        assert!(!controller.is_running());
        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_never_ticks_but_stop_exports_once() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(ConfigResponse::new("v1", vec![]));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.exporter.export_count(), 0);
        assert_eq!(h.controller.resolver().tick_period(), Duration::ZERO);

        h.controller.stop().await.unwrap();
        assert_eq!(h.exporter.export_count(), 1);
        assert!(h.exporter.exports()[0].is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_config_exports_empty_round() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_error(DynMetricError::Transport("down".into()));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.accumulator.calls(), 0);

        h.controller.stop().await.unwrap();
        assert_eq!(h.exporter.export_count(), 1);
        assert!(h.exporter.exports()[0].is_empty());
        assert_eq!(h.errors.flush(), vec![DynMetricError::Transport("down".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn export_errors_are_reported_and_loop_continues() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(every(1));
        h.exporter.fail_next(DynMetricError::Export("sink down".into()));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(h.errors.flush(), vec![DynMetricError::Export("sink down".into())]);
        assert_eq!(h.controller.metrics().export_errors(), 1);
        assert_eq!(h.exporter.export_count(), 2);

        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_collection_times_out_and_is_reported() {
        let h = harness(&["cpu"], |o| o.with_timeout(Duration::from_secs(2)));
        h.transport.push_response(every(10));
        h.accumulator.set_delay(Duration::from_secs(5));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(13)).await;

        assert_eq!(h.exporter.export_count(), 0);
        assert_eq!(h.errors.flush(), vec![DynMetricError::Timeout(Duration::from_secs(2))]);
        assert_eq!(h.controller.metrics().timeouts(), 1);

        h.accumulator.set_delay(Duration::ZERO);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_never_overlap() {
        let h = harness(&["cpu"], |o| o.with_timeout(Duration::from_secs(30)));
        h.transport.push_response(every(1));
        h.accumulator.set_delay(Duration::from_millis(2500));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert!(h.accumulator.calls() > 1);
        assert_eq!(h.accumulator.overlapping_calls(), 0);

        h.accumulator.set_delay(Duration::ZERO);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn outside_reader_contends_on_processor_lock() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(every(1));

        h.controller.start().await.unwrap();
        let processor = h.controller.processor();
        let guard = processor.lock().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.exporter.export_count(), 0);
        drop(guard);

        settle().await;
        assert_eq!(h.exporter.exports()[0].names(), vec!["cpu"]);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_resumes_ticking() {
        let h = harness(&["cpu"], |o| o);
        h.transport.push_response(every(1));

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        h.controller.stop().await.unwrap();
        assert_eq!(h.exporter.export_count(), 3, "two ticks and the drain");
        assert!(h.transport.is_closed());

        h.transport.push_response(ConfigResponse::new("v2", vec![Schedule::new(vec![Pattern::any()], 1)]));
        let restarted_at = Instant::now();
        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());
        assert!(!h.transport.is_closed());
        assert_eq!(h.controller.resolver().start(), Some(restarted_at.into_std()));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let exports = h.exporter.exports();
        assert_eq!(exports.len(), 5);
        assert!(exports[3..].iter().all(|set| set.names() == vec!["cpu"]));
        assert!(h.errors.is_empty(), "unexpected errors: {:?}", h.errors.flush());

        h.controller.stop().await.unwrap();
        assert!(!h.controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn is_running_holds_through_concurrent_stop() {
        let h = harness(&["cpu"], |o| o.with_timeout(Duration::from_secs(30)));
        h.transport.push_response(every(10));
        h.exporter.set_delay(Duration::from_secs(3));

        h.controller.start().await.unwrap();
        settle().await;

        let controller = Arc::new(h.controller);
        let stopping = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.stop().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(controller.is_running(), "drain still exporting");

        stopping.await.unwrap().unwrap();
        assert!(!controller.is_running());
        assert_eq!(h.exporter.export_count(), 1);
    }

    /// Marks `cpu` collected, then never returns on its first due round.
    #[derive(Debug, Default)]
    struct StallingAccumulator {
        stalled: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl Accumulator for StallingAccumulator {
        async fn collect(
            &self,
            rule: &dynmetric_core::CollectionRule<'_>,
            processor: &mut dyn Processor,
        ) -> usize {
            if !rule.is_due("cpu") {
                return 0;
            }
            if !self.stalled.swap(true, Ordering::SeqCst) {
                pending::<()>().await;
            }
            usize::from(processor.process(dynmetric_core::Record::new("cpu", 1.0)).is_ok())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_round_is_collected_on_next_tick() {
        let exporter = RecordingExporter::new();
        let transport = MockConfigTransport::new();
        let errors = Arc::new(RecordingErrorHandler::new());
        transport.push_response(ConfigResponse::new(
            "v1",
            vec![
                Schedule::new(vec![Pattern::equals("cpu")], 10),
                Schedule::new(vec![Pattern::equals("heartbeat")], 1),
            ],
        ));
        let options = PushControllerOptions::new("mock://config")
            .with_connector(Arc::new(MockConnector::new(transport)))
            .with_error_handler(errors.clone())
            .with_poll_interval(Duration::from_secs(3600))
            .with_timeout(Duration::from_secs(2));
        let controller = PushController::new(
            Arc::new(StallingAccumulator::default()),
            BasicProcessor::new(),
            Arc::new(exporter.clone()),
            options,
        );

        controller.start().await.unwrap();
        // cpu falls due at 9s; that round stalls until its 11s deadline and
        // the next tick is at 12s
        tokio::time::sleep(Duration::from_millis(13_500)).await;

        assert_eq!(errors.flush(), vec![DynMetricError::Timeout(Duration::from_secs(2))]);
        let exports = exporter.exports();
        assert_eq!(exports.len(), 10, "ticks 1..=8, 12 and 13");
        assert!(exports[..8].iter().all(|set| set.is_empty()));
        assert_eq!(exports[8].names(), vec!["cpu"]);
        assert!(exports[9].is_empty());

        controller.stop().await.unwrap();
    }

    #[test]
    fn ticker_aligns_to_start_grid() {
        let origin = Instant::now();
        let secs = Duration::from_secs;

        assert_eq!(CollectionTicker::aligned(origin, secs(5), origin).next, origin + secs(5));
        assert_eq!(CollectionTicker::aligned(origin, secs(10), origin + secs(6)).next, origin + secs(10));
        assert_eq!(CollectionTicker::aligned(origin, secs(10), origin + secs(10)).next, origin + secs(10));
        assert_eq!(CollectionTicker::aligned(origin, secs(7), origin + secs(15)).next, origin + secs(21));

        let mut ticker = CollectionTicker::aligned(origin, secs(1), origin);
        assert!(!ticker.is_due(origin));
        assert!(ticker.is_due(origin + secs(1)));
        ticker.advance(origin + Duration::from_millis(3500));
        assert_eq!(ticker.next, origin + secs(4));
    }

    #[test]
    fn tick_timeout_falls_back() {
        let h = harness(&[], |o| o);
        assert_eq!(h.controller.shared.tick_timeout(), FALLBACK_TIMEOUT);

        h.controller.resolver().apply_schedules(vec![Schedule::new(vec![Pattern::any()], 7)]).unwrap();
        assert_eq!(h.controller.shared.tick_timeout(), Duration::from_secs(7));

        let h = harness(&[], |o| o.with_timeout(Duration::from_secs(1)));
        assert_eq!(h.controller.shared.tick_timeout(), Duration::from_secs(1));
    }
}
