//! steward-core
//!
//! Core building blocks for the steward fleet agent and its director-side
//! scheduler.
//!
//! # Modules
//! - **domain**: data model (ids, messages, errors, schedule entries, snapshot manifests)
//! - **ports**: traits at the seams (Mounter, DiskLocator, DirCopier, Infrastructure, DatabaseDumper, Clock, IdGenerator)
//! - **impls**: port implementations (SystemMounter, TableMounter, CpCopier, ...)
//! - **typed**: typed message API (Message trait, Handler trait, MessageRegistry)
//! - **tracker**: lifecycle state of long-running tasks
//! - **app**: context, builder, dispatcher, mount guard, scheduler, reporter
//! - **actions**: agent commands (ping, get_task, mount_disk, migrate_disk, snapshot, backup)
//! - **archive**: tar + gzip helpers for the backup job
//! - **config**: TOML configuration
//! - **observability**: status views

pub mod actions;
pub mod app;
pub mod archive;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod tracker;
pub mod typed;
