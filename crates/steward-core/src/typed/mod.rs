//! Typed message API.
//!
//! Command names are bound to argument types at compile time; the registry
//! only ever sees the object-safe `DynHandler`.
//!
//! # Two layers
//! - **Typed surface**: `Message` trait, `Handler<M>` trait
//! - **Dyn core**: `DynHandler` trait, object-safe and type-erased

pub mod handler;
pub mod message;
pub mod registry;

pub use self::handler::{DynHandler, Handler, TypedHandler, decode_arguments};
pub use self::message::Message;
pub use self::registry::{MessageRegistry, RegistryError};
