//! Message trait - binds a command name and execution class to an argument type.

use serde::de::DeserializeOwned;

use crate::domain::ExecutionClass;

/// A typed agent command.
///
/// # Example
/// ```ignore
/// #[derive(Deserialize)]
/// struct MountDisk {
///     cid: String,
/// }
///
/// impl Message for MountDisk {
///     const NAME: &'static str = "mount_disk";
///     const CLASS: ExecutionClass = ExecutionClass::LongRunning;
/// }
/// ```
///
/// The ordered argument list arrives as a JSON array. Structs with named
/// fields decode from it positionally, so `["vol-1"]` becomes
/// `MountDisk { cid: "vol-1" }`; an argument-less command is an empty braced
/// struct (`struct Ping {}`).
pub trait Message: DeserializeOwned + Send + Sync + 'static {
    const NAME: &'static str;

    const CLASS: ExecutionClass;
}
