//! FleetScheduler - fires snapshot and backup jobs on their cadences.
//!
//! Each tick evaluates every entry against one `now`:
//! - not due: nothing happens
//! - due, previous firing still running: the window is skipped
//! - due: the job is dispatched (spawned, never awaited)
//!
//! In every due case `last_fired` moves to `now`, so one window fires at most
//! once whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::app::{DispatchOutcome, Dispatcher, Report};
use crate::domain::{AgentError, ScheduleEntry, TaskId};
use crate::ports::Clock;

struct Slot {
    entry: ScheduleEntry,
    /// Task of the last firing, until it is seen terminal.
    in_flight: Option<TaskId>,
}

/// What one tick did, by entry name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub fired: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

pub struct FleetScheduler {
    slots: Vec<Slot>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl FleetScheduler {
    pub fn new(
        entries: Vec<ScheduleEntry>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            slots: entries
                .into_iter()
                .map(|entry| Slot {
                    entry,
                    in_flight: None,
                })
                .collect(),
            dispatcher,
            clock,
            tick_interval,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.slots.iter().map(|slot| &slot.entry)
    }

    pub async fn tick(&mut self, now: chrono::DateTime<chrono::Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        for slot in &mut self.slots {
            let name = slot.entry.name.clone();

            if let Some(previous) = slot.in_flight {
                match self.dispatcher.tracker().get_state(previous).await {
                    Some(record) if record.state.is_terminal() => {
                        let report = Report::from_record(&record);
                        if report.is_success() {
                            info!(entry = %name, task_id = %previous, "firing finished");
                        } else {
                            error!(
                                entry = %name,
                                task_id = %previous,
                                report = %report.render_line(),
                                "firing finished with failure"
                            );
                        }
                        slot.in_flight = None;
                    }
                    Some(_) => {}
                    None => slot.in_flight = None,
                }
            }

            if !slot.entry.is_due(now) {
                continue;
            }
            slot.entry.mark_fired(now);

            if let Some(previous) = slot.in_flight {
                info!(
                    entry = %name,
                    task_id = %previous,
                    "previous firing still running, skipping this window"
                );
                summary.skipped.push(name);
                continue;
            }

            match fire(&self.dispatcher, &slot.entry).await {
                Ok(DispatchOutcome::Task(id)) => {
                    info!(entry = %name, task_id = %id, job = ?slot.entry.job, "fired");
                    slot.in_flight = Some(id);
                    summary.fired.push(name);
                }
                Ok(DispatchOutcome::Value(_)) => {
                    info!(entry = %name, job = ?slot.entry.job, "fired inline");
                    summary.fired.push(name);
                }
                Err(err) => {
                    error!(entry = %name, error = %err, "scheduled firing failed");
                    summary.failed.push(name);
                }
            }
        }

        summary
    }

    /// Tick until `shutdown` turns true or its sender goes away.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            entries = self.slots.len(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "fleet scheduler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = self.clock.now();
                    let summary = self.tick(now).await;
                    if !summary.failed.is_empty() {
                        warn!(failed = ?summary.failed, "tick finished with failed firings");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("fleet scheduler stopped");
    }
}

async fn fire(dispatcher: &Dispatcher, entry: &ScheduleEntry) -> Result<DispatchOutcome, AgentError> {
    dispatcher
        .dispatch(entry.job.message_name(), Vec::new())
        .await
        .map_err(|e| AgentError::ScheduleFiringFailure {
            entry: entry.name.clone(),
            cause: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone, Utc};
    use serde::Deserialize;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::domain::{ExecutionClass, JobKind};
    use crate::ports::{FixedClock, UlidGenerator};
    use crate::tracker::{InMemoryTaskTracker, TaskTracker};
    use crate::typed::{Handler, Message, MessageRegistry};

    #[derive(Deserialize)]
    struct SnapshotJob {}

    impl Message for SnapshotJob {
        const NAME: &'static str = "snapshot_deployments";
        const CLASS: ExecutionClass = ExecutionClass::LongRunning;
    }

    struct CountingHandler {
        runs: Arc<AtomicUsize>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Handler<SnapshotJob> for CountingHandler {
        async fn handle(&self, _message: SnapshotJob) -> Result<serde_json::Value, AgentError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.map_err(|e| AgentError::Snapshot {
                cause: e.to_string(),
            })?;
            Ok(serde_json::json!({}))
        }
    }

    struct Harness {
        scheduler: FleetScheduler,
        clock: Arc<FixedClock>,
        runs: Arc<AtomicUsize>,
        gate: Arc<Semaphore>,
        tracker: Arc<dyn TaskTracker>,
    }

    const HOUR: Duration = Duration::from_secs(3600);

    /// Only the snapshot job is registered; the backup job has no handler.
    fn harness(entries: Vec<ScheduleEntry>, permits: usize) -> Harness {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let tracker: Arc<dyn TaskTracker> = Arc::new(InMemoryTaskTracker::new(
            Arc::new(UlidGenerator::new(clock.clone())),
            clock.clone(),
        ));
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(permits));

        let mut registry = MessageRegistry::new();
        registry
            .register::<SnapshotJob, _>(CountingHandler {
                runs: runs.clone(),
                gate: gate.clone(),
            })
            .unwrap();
        let dispatcher = Dispatcher::new(registry, tracker.clone());

        Harness {
            scheduler: FleetScheduler::new(
                entries,
                dispatcher,
                clock.clone(),
                Duration::from_millis(10),
            ),
            clock,
            runs,
            gate,
            tracker,
        }
    }

    fn snapshots_hourly() -> ScheduleEntry {
        ScheduleEntry::new("hourly-snapshots", JobKind::Snapshot, HOUR)
    }

    async fn settle(h: &Harness) {
        for _ in 0..100 {
            if h.tracker.counts().await.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("tasks did not settle");
    }

    #[tokio::test]
    async fn two_ticks_in_one_window_fire_once() {
        let mut h = harness(vec![snapshots_hourly()], 10);
        let t0 = h.clock.now();

        let first = h.scheduler.tick(t0).await;
        let second = h.scheduler.tick(t0 + TimeDelta::minutes(30)).await;
        settle(&h).await;

        assert_eq!(first.fired, vec!["hourly-snapshots"]);
        assert!(second.fired.is_empty());
        assert_eq!(h.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn next_window_fires_again() {
        let mut h = harness(vec![snapshots_hourly()], 10);
        let t0 = h.clock.now();

        h.scheduler.tick(t0).await;
        settle(&h).await;
        let later = h.scheduler.tick(t0 + TimeDelta::hours(1)).await;
        settle(&h).await;

        assert_eq!(later.fired, vec!["hourly-snapshots"]);
        assert_eq!(h.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overlapping_window_is_skipped_not_queued() {
        let mut h = harness(vec![snapshots_hourly()], 0);
        let t0 = h.clock.now();

        h.scheduler.tick(t0).await;
        let overlapped = h.scheduler.tick(t0 + TimeDelta::hours(1)).await;

        assert_eq!(overlapped.skipped, vec!["hourly-snapshots"]);
        assert_eq!(
            h.scheduler.entries().next().unwrap().last_fired,
            Some(t0 + TimeDelta::hours(1))
        );

        h.gate.add_permits(10);
        settle(&h).await;
        let resumed = h.scheduler.tick(t0 + TimeDelta::hours(2)).await;
        settle(&h).await;

        assert_eq!(resumed.fired, vec!["hourly-snapshots"]);
        assert_eq!(h.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_firing_is_absorbed_and_spends_the_window() {
        let backup = ScheduleEntry::new("nightly-backup", JobKind::Backup, HOUR);
        let mut h = harness(vec![backup, snapshots_hourly()], 10);
        let t0 = h.clock.now();

        let first = h.scheduler.tick(t0).await;
        let again = h.scheduler.tick(t0 + TimeDelta::minutes(1)).await;
        settle(&h).await;

        assert_eq!(first.failed, vec!["nightly-backup"]);
        assert_eq!(first.fired, vec!["hourly-snapshots"]);
        assert_eq!(again, TickSummary::default());
        assert_eq!(
            h.scheduler.entries().next().unwrap().last_fired,
            Some(t0)
        );
    }

    #[tokio::test]
    async fn disabled_entry_never_fires() {
        let mut h = harness(vec![snapshots_hourly().disabled()], 10);
        let t0 = h.clock.now();

        let summary = h.scheduler.tick(t0).await;

        assert_eq!(summary, TickSummary::default());
        assert_eq!(h.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fire_wraps_dispatch_errors() {
        let h = harness(Vec::new(), 10);
        let entry = ScheduleEntry::new("nightly-backup", JobKind::Backup, HOUR);

        let err = fire(&h.scheduler.dispatcher, &entry).await.unwrap_err();

        match err {
            AgentError::ScheduleFiringFailure { entry, cause } => {
                assert_eq!(entry, "nightly-backup");
                assert!(cause.contains("scheduled_backup"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let h = harness(vec![snapshots_hourly()], 10);
        let runs = h.runs.clone();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(h.scheduler.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        // the clock never moves, so only the first window fired
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
