//! Port implementations.
//!
//! - **SystemMounter** / **CpCopier** / **CommandDumper**: host tools
//! - **SettingsDiskLocator**: cid -> device from agent settings
//! - **DirectoryInfrastructure**: file-backed snapshots
//! - **TableMounter**: in-process mount table (dry runs, tests)

pub mod command_dumper;
pub mod cp_copier;
pub mod directory_infrastructure;
pub mod settings_disks;
pub mod system_mounter;
pub mod table_mounter;

pub use self::command_dumper::CommandDumper;
pub use self::cp_copier::CpCopier;
pub use self::directory_infrastructure::DirectoryInfrastructure;
pub use self::settings_disks::SettingsDiskLocator;
pub use self::system_mounter::SystemMounter;
pub use self::table_mounter::{MountEvent, MountedDevice, TableMounter};
