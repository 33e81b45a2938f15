//! Ports
//!
//! Each trait is the seam to something outside the agent process: the host's
//! mount table, the device inventory, the cloud layer, the director database.
//! Production and in-process implementations live in `impls`.

pub mod clock;
pub mod copier;
pub mod disks;
pub mod dumper;
pub mod id_generator;
pub mod infrastructure;
pub mod mounter;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::copier::DirCopier;
pub use self::disks::{Disk, DiskLocator};
pub use self::dumper::DatabaseDumper;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::infrastructure::Infrastructure;
pub use self::mounter::{MountOptions, Mounter};
