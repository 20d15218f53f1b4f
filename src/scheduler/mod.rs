//! Live data-synchronization scheduler.
//!
//! Owns one repeating timer per domain. Timers and fetches never touch
//! dashboard state directly: they post [`SchedulerEvent`]s to the event loop,
//! which hands them back to [`RefreshScheduler::on_tick`] and
//! [`RefreshScheduler::on_fetched`]. All state is therefore mutated from the
//! loop only.

pub mod domain;
pub mod regions;
pub mod task;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::api::{DataSource, DomainData, FetchError};
use crate::config::CadenceConfig;

pub use domain::Domain;
pub use regions::{DisplayRegions, RegionState};
pub use task::RefreshTask;

/// Events posted back to the event loop by timers and fetch tasks.
#[derive(Debug)]
pub enum SchedulerEvent {
    /// A domain's timer fired
    Tick(Domain),
    /// A dispatched fetch finished
    Fetched {
        domain: Domain,
        result: Result<DomainData, FetchError>,
    },
}

/// Periodic per-domain fetch-and-render driver.
pub struct RefreshScheduler {
    source: Arc<dyn DataSource>,
    base_interval: Duration,
    cadence: CadenceConfig,
    /// Armed timers; non-empty exactly while running
    tasks: HashMap<Domain, RefreshTask>,
    /// Domains with an outstanding fetch
    in_flight: HashSet<Domain>,
    events: UnboundedSender<SchedulerEvent>,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn DataSource>,
        base_interval: Duration,
        cadence: CadenceConfig,
        events: UnboundedSender<SchedulerEvent>,
    ) -> Self {
        Self {
            source,
            base_interval,
            cadence,
            tasks: HashMap::new(),
            in_flight: HashSet::new(),
            events,
        }
    }

    /// Arm one timer per domain, replacing any existing timers.
    pub fn start(&mut self) {
        for domain in Domain::ALL {
            // Cancel the old handle before creating the new one
            if let Some(old) = self.tasks.remove(&domain) {
                old.cancel();
            }
            let multiplier = self.cadence.multiplier(domain);
            let period = Domain::period(self.base_interval, multiplier);
            let task = RefreshTask::arm(domain, period, self.events.clone());
            self.tasks.insert(domain, task);
        }
        info!(
            event = "scheduler.started",
            base_interval_ms = self.base_interval.as_millis() as u64,
        );
    }

    /// Cancel every armed timer. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for (_, task) in self.tasks.drain() {
            task.cancel();
        }
        info!(event = "scheduler.stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Number of armed timers for a domain (0 or 1)
    pub fn timer_count(&self, domain: Domain) -> usize {
        usize::from(self.tasks.contains_key(&domain))
    }

    /// Effective period of a domain's timer while running
    pub fn period(&self, domain: Domain) -> Option<Duration> {
        self.tasks.get(&domain).map(|t| t.period)
    }

    pub fn is_in_flight(&self, domain: Domain) -> bool {
        self.in_flight.contains(&domain)
    }

    /// Handle a timer tick. Returns true if a fetch was dispatched.
    ///
    /// Ticks that were already queued when the scheduler stopped are ignored.
    pub fn on_tick(&mut self, domain: Domain) -> bool {
        if !self.tasks.contains_key(&domain) {
            debug!(event = "scheduler.tick.ignored", domain = %domain);
            return false;
        }
        self.dispatch(domain)
    }

    /// Fetch one domain in the background unless a fetch is already outstanding.
    pub fn dispatch(&mut self, domain: Domain) -> bool {
        if !self.in_flight.insert(domain) {
            debug!(event = "scheduler.tick.skipped_in_flight", domain = %domain);
            return false;
        }

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = source.fetch(domain).await;
            let _ = events.send(SchedulerEvent::Fetched { domain, result });
        });
        true
    }

    /// Dispatch every domain without waiting; results arrive as events.
    pub fn refresh_all(&mut self) -> usize {
        Domain::ALL
            .into_iter()
            .filter(|&domain| self.dispatch(domain))
            .count()
    }

    /// Run every domain's fetch concurrently and render all results.
    ///
    /// Domains that already have a fetch outstanding are left to that fetch.
    pub async fn load_all(&mut self, regions: &mut DisplayRegions) {
        let domains: Vec<Domain> = Domain::ALL
            .into_iter()
            .filter(|&d| self.in_flight.insert(d))
            .collect();

        let source = Arc::clone(&self.source);
        let results = join_all(domains.into_iter().map(|domain| {
            let source = Arc::clone(&source);
            async move { (domain, source.fetch(domain).await) }
        }))
        .await;

        for (domain, result) in results {
            self.on_fetched(domain, result, regions);
        }
    }

    /// Render a finished fetch into its domain's region.
    /// Returns true if the region changed.
    pub fn on_fetched(
        &mut self,
        domain: Domain,
        result: Result<DomainData, FetchError>,
        regions: &mut DisplayRegions,
    ) -> bool {
        self.in_flight.remove(&domain);
        match result {
            Ok(data) if data.domain() == domain => regions.render(data),
            Ok(data) => {
                warn!(
                    event = "scheduler.fetch.domain_mismatch",
                    domain = %domain,
                    got = %data.domain(),
                );
                regions.render_error(domain, "response belongs to another domain")
            }
            Err(e) => {
                warn!(event = "scheduler.fetch.failed", domain = %domain, error = %e);
                regions.render_error(domain, &e.to_string())
            }
        }
    }

    /// Route an event from the loop.
    pub fn handle_event(&mut self, event: SchedulerEvent, regions: &mut DisplayRegions) {
        match event {
            SchedulerEvent::Tick(domain) => {
                self.on_tick(domain);
            }
            SchedulerEvent::Fetched { domain, result } => {
                self.on_fetched(domain, result, regions);
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{empty, FakeDataSource};
    use crate::api::{GpuSample, SystemSnapshot};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn scheduler(
        source: &FakeDataSource,
        base: Duration,
        cadence: CadenceConfig,
    ) -> (RefreshScheduler, UnboundedReceiver<SchedulerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sched = RefreshScheduler::new(Arc::new(source.clone()), base, cadence, tx);
        (sched, rx)
    }

    fn uniform_cadence() -> CadenceConfig {
        CadenceConfig {
            gpu: 1,
            system: 1,
            models: 1,
            tokens: 1,
            config: 1,
        }
    }

    fn drain_ticks(rx: &mut UnboundedReceiver<SchedulerEvent>) -> HashMap<Domain, usize> {
        let mut ticks = HashMap::new();
        while let Ok(event) = rx.try_recv() {
            if let SchedulerEvent::Tick(domain) = event {
                *ticks.entry(domain).or_insert(0) += 1;
            }
        }
        ticks
    }

    fn gpu(server: &str) -> GpuSample {
        GpuSample {
            server_name: server.to_string(),
            gpu_index: 0,
            gpu_name: Some("A100".to_string()),
            utilization_gpu: Some(50.0),
            utilization_memory: Some(20.0),
            memory_total: Some(81920),
            memory_used: Some(16384),
            temperature: Some(60.0),
            power_draw: Some(250.0),
            process_count: Some(1),
            status: Some("BUSY".to_string()),
        }
    }

    fn system(server: &str) -> SystemSnapshot {
        SystemSnapshot {
            server_name: server.to_string(),
            cpu_count: Some(64),
            cpu_usage: Some(12.0),
            load_average: Some("1.0,0.8,0.5".to_string()),
            memory_percent: Some(40.0),
            disk_percent: Some(70.0),
            uptime: Some(3600),
            server_status: Some("online".to_string()),
            gpu_summary: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_one_timer_per_domain() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(1), uniform_cadence());

        sched.start();
        sched.start();
        for domain in Domain::ALL {
            assert_eq!(sched.timer_count(domain), 1);
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let ticks = drain_ticks(&mut rx);
        for domain in Domain::ALL {
            assert_eq!(ticks.get(&domain), Some(&1), "{domain}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cadence_multiplier_scales_period() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) =
            scheduler(&source, Duration::from_secs(1), CadenceConfig::default());

        sched.start();
        assert_eq!(sched.period(Domain::Config), Some(Duration::from_secs(6)));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let ticks = drain_ticks(&mut rx);
        assert_eq!(ticks.get(&Domain::Gpu), Some(&2));
        assert_eq!(ticks.get(&Domain::Models), Some(&1));
        assert_eq!(ticks.get(&Domain::Config), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_ticks_render_nothing() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(1), uniform_cadence());
        let mut regions = DisplayRegions::new();

        sched.start();
        sched.stop();
        sched.stop();
        assert!(!sched.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain_ticks(&mut rx).is_empty());

        // Ticks that were queued before the stop are ignored as well
        for _ in 0..3 {
            assert!(!sched.on_tick(Domain::Gpu));
        }
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(source.calls(Domain::Gpu), 0);
        assert_eq!(regions.get(Domain::Gpu), &RegionState::Loading);

        sched.load_all(&mut regions).await;
        assert!(matches!(regions.get(Domain::Gpu), RegionState::Ready { .. }));
    }

    #[tokio::test]
    async fn test_failure_in_one_domain_leaves_others_intact() {
        let source = FakeDataSource::with_empty_data();
        source.respond(Domain::System, DomainData::System(vec![system("gpu-1")]));
        let (mut sched, _rx) = scheduler(&source, Duration::from_secs(5), uniform_cadence());
        let mut regions = DisplayRegions::new();

        sched.load_all(&mut regions).await;
        let system_before = regions.get(Domain::System).clone();

        source.reject(Domain::Gpu, "x");
        source.reject(Domain::Models, "model service unavailable");
        sched.load_all(&mut regions).await;

        match regions.get(Domain::Gpu) {
            RegionState::Failed { message, .. } => assert!(message.contains('x')),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            regions.get(Domain::Models),
            RegionState::Failed { .. }
        ));
        match (&system_before, regions.get(Domain::System)) {
            (
                RegionState::Ready { data: before, .. },
                RegionState::Ready { data: after, .. },
            ) => assert_eq!(before, after),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(regions.get(Domain::Tokens), RegionState::Ready { .. }));
    }

    #[tokio::test]
    async fn test_gpu_rejection_scenario_keeps_system_render() {
        let source = FakeDataSource::with_empty_data();
        source.respond(Domain::Gpu, DomainData::Gpu(vec![gpu("gpu-1")]));
        source.respond(Domain::System, DomainData::System(vec![system("gpu-1")]));
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(5), uniform_cadence());
        let mut regions = DisplayRegions::new();
        sched.load_all(&mut regions).await;

        source.reject(Domain::Gpu, "x");
        assert!(sched.dispatch(Domain::Gpu));
        let event = rx.recv().await.unwrap();
        sched.handle_event(event, &mut regions);

        match regions.get(Domain::Gpu) {
            RegionState::Failed { message, .. } => {
                assert_eq!(message, "Failed to load GPU data: x");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match regions.get(Domain::System) {
            RegionState::Ready { data, .. } => {
                assert_eq!(data, &DomainData::System(vec![system("gpu-1")]));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tick_skipped_while_fetch_in_flight() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(5), uniform_cadence());
        let mut regions = DisplayRegions::new();
        sched.start();

        assert!(sched.on_tick(Domain::Gpu));
        assert!(sched.is_in_flight(Domain::Gpu));
        assert!(!sched.on_tick(Domain::Gpu));
        assert!(sched.on_tick(Domain::System));

        let mut fetched = 0;
        while fetched < 2 {
            if let SchedulerEvent::Fetched { domain, result } = rx.recv().await.unwrap() {
                sched.on_fetched(domain, result, &mut regions);
                fetched += 1;
            }
        }
        assert_eq!(source.calls(Domain::Gpu), 1);
        assert!(!sched.is_in_flight(Domain::Gpu));
        assert!(sched.on_tick(Domain::Gpu));
    }

    #[tokio::test]
    async fn test_refresh_all_dispatches_each_domain_once() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(5), uniform_cadence());
        let mut regions = DisplayRegions::new();

        assert_eq!(sched.refresh_all(), Domain::ALL.len());
        assert_eq!(sched.refresh_all(), 0);

        for _ in Domain::ALL {
            let event = rx.recv().await.unwrap();
            sched.handle_event(event, &mut regions);
        }
        for domain in Domain::ALL {
            assert_eq!(source.calls(domain), 1);
            match regions.get(domain) {
                RegionState::Ready { data, .. } => assert_eq!(data, &empty(domain)),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_result_after_teardown_is_ignored() {
        let source = FakeDataSource::with_empty_data();
        let (mut sched, mut rx) = scheduler(&source, Duration::from_secs(5), uniform_cadence());
        let mut regions = DisplayRegions::new();

        sched.start();
        assert!(sched.on_tick(Domain::Tokens));
        sched.stop();
        regions.tear_down();

        let event = rx.recv().await.unwrap();
        let SchedulerEvent::Fetched { domain, result } = event else {
            panic!("expected fetch result");
        };
        assert!(!sched.on_fetched(domain, result, &mut regions));
        assert_eq!(regions.get(Domain::Tokens), &RegionState::Loading);
    }
}
