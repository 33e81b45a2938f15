//! Domain model (ids, messages, errors, schedule entries, snapshot manifests).

pub mod errors;
pub mod ids;
pub mod message;
pub mod schedule;
pub mod snapshot;

pub use self::errors::{AgentError, ErrorKind};
pub use self::ids::{IdParseError, SnapshotId, TaskId};
pub use self::message::{Envelope, ExecutionClass, MessageName};
pub use self::schedule::{JobKind, ScheduleEntry};
pub use self::snapshot::{ManagedInstance, SnapshotManifest};
