//! App layer: combines the ports into agent and director behaviour.
//!
//! # Components
//! - **AgentContext**: settings and collaborators, built once at startup
//! - **AgentBuilder**: registration and startup validation
//! - **Dispatcher**: runs Sync and LongRunning handlers
//! - **MountGuard**: idempotent mount and unmount
//! - **FleetScheduler**: recurring snapshot and backup jobs
//! - **Report**: shapes final outcomes

pub mod builder;
pub mod context;
pub mod dispatcher;
pub mod mount_guard;
pub mod report;
pub mod scheduler;

pub use self::builder::{AgentBuilder, BuildError};
pub use self::context::{AgentContext, DirectorIdentity};
pub use self::dispatcher::{DispatchOutcome, Dispatcher};
pub use self::mount_guard::MountGuard;
pub use self::report::{ExceptionReport, Report, backup_confirmation};
pub use self::scheduler::{FleetScheduler, TickSummary};
