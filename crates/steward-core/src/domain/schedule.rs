//! Schedule entries for the director-side recurring jobs.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// The fleet-wide maintenance jobs the scheduler can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Snapshot,
    Backup,
}

impl JobKind {
    /// The agent message a firing of this job dispatches.
    pub fn message_name(self) -> &'static str {
        match self {
            JobKind::Snapshot => "snapshot_deployments",
            JobKind::Backup => "scheduled_backup",
        }
    }
}

/// One recurring job definition.
///
/// `last_fired` moves on every firing attempt, successful or not, so a window
/// is spent as soon as the scheduler decides to fire in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub name: String,
    pub job: JobKind,
    pub cadence: Duration,
    pub enabled: bool,
    pub last_fired: Option<DateTime<Utc>>,
}

impl ScheduleEntry {
    pub fn new(name: impl Into<String>, job: JobKind, cadence: Duration) -> Self {
        Self {
            name: name.into(),
            job,
            cadence,
            enabled: true,
            last_fired: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Has a full cadence elapsed since the last firing?
    ///
    /// An entry that never fired is due immediately.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(last) = self.last_fired else {
            return true;
        };
        match TimeDelta::from_std(self.cadence) {
            Ok(cadence) => now.signed_duration_since(last) >= cadence,
            // a cadence too large for chrono never elapses
            Err(_) => false,
        }
    }

    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn never_fired_entry_is_due() {
        let entry = ScheduleEntry::new("snapshots", JobKind::Snapshot, Duration::from_secs(60));
        assert!(entry.is_due(at(0)));
    }

    #[test]
    fn disabled_entry_is_never_due() {
        let entry =
            ScheduleEntry::new("snapshots", JobKind::Snapshot, Duration::from_secs(60)).disabled();
        assert!(!entry.is_due(at(0)));
        assert!(!entry.is_due(at(10_000)));
    }

    #[rstest]
    #[case::same_instant(0, false)]
    #[case::inside_window(59, false)]
    #[case::window_boundary(60, true)]
    #[case::well_past(3_600, true)]
    fn due_only_after_a_full_cadence(#[case] elapsed: i64, #[case] due: bool) {
        let mut entry = ScheduleEntry::new("backups", JobKind::Backup, Duration::from_secs(60));
        entry.mark_fired(at(0));
        assert_eq!(entry.is_due(at(elapsed)), due);
    }

    #[test]
    fn job_kinds_map_to_agent_messages() {
        assert_eq!(JobKind::Snapshot.message_name(), "snapshot_deployments");
        assert_eq!(JobKind::Backup.message_name(), "scheduled_backup");
    }

    #[test]
    fn job_kind_reads_config_spelling() {
        let kind: JobKind = serde_json::from_str("\"backup\"").unwrap();
        assert_eq!(kind, JobKind::Backup);
    }
}
