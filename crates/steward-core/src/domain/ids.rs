//! Domain identifiers (strongly-typed IDs).
//!
//! All identifiers are ULIDs wrapped in `Id<T>`, where `T` is a zero-sized
//! marker. The marker never exists at runtime; it only keeps a `TaskId` from
//! being passed where a `SnapshotId` is expected.
//!
//! On the wire an id is its display form (`task-01J...`), so a task id handed
//! out by `dispatch` can be fed back verbatim to `get_task`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker provides the display prefix of an id type.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("id `{value}` does not start with `{expected}`")]
    MissingPrefix { value: String, expected: &'static str },

    #[error("id `{value}` is not a valid ULID")]
    InvalidUlid { value: String },
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(T::prefix())
            .ok_or_else(|| IdParseError::MissingPrefix {
                value: s.to_string(),
                expected: T::prefix(),
            })?;
        let ulid = Ulid::from_string(raw).map_err(|_| IdParseError::InvalidUlid {
            value: s.to_string(),
        })?;
        Ok(Self::from_ulid(ulid))
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ========================================
// Markers
// ========================================

/// Marker for long-running task ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Marker for disk snapshot ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Snapshot {}

impl IdMarker for Snapshot {
    fn prefix() -> &'static str {
        "snapshot-"
    }
}

/// Identifier of one dispatched long-running message.
pub type TaskId = Id<Task>;

/// Identifier of an infrastructure-level disk snapshot.
pub type SnapshotId = Id<Snapshot>;
