//! IdGenerator port. `UlidGenerator` is the clock-seeded production impl.

use crate::domain::ids::{SnapshotId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator hands out ids for tasks and snapshots.
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_snapshot_id(&self) -> SnapshotId;
}

/// ULIDs stamped with the injected clock's time.
///
/// With a `FixedClock` ids still differ (random part) but sort deterministically
/// by timestamp.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_snapshot_id(&self) -> SnapshotId {
        SnapshotId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generates_unique_task_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn fixed_clock_stamps_the_timestamp() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed));

        let id = id_gen.generate_snapshot_id();
        assert_eq!(id.as_ulid().timestamp_ms(), fixed.timestamp_millis() as u64);
    }
}
