//! # Cache Entries
//!
//! The state the cache keeps per key, and the read-only snapshot handed to
//! callers. Values are type-erased ([`AnyValue`]) so one store can hold actor
//! handles, lists and singletons side by side; typed access goes through
//! [`EntrySnapshot::data_as`].

use crate::error::{CacheError, SharedError};
use crate::key::QueryKey;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A type-erased cached value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Monotonic per-key sequence number used to fence fetch and mutation results.
pub type Ticket = u64;

/// Whether the entry holds a value, an error, or neither yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Pending,
    Success,
    Error,
}

/// Whether a fetch for the entry is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
}

/// A point-in-time copy of one cache entry.
#[derive(Clone)]
pub struct EntrySnapshot {
    pub key: QueryKey,
    pub data: Option<AnyValue>,
    pub error: Option<SharedError>,
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    pub invalidated: bool,
    pub data_updated_at: Option<Instant>,
}

impl EntrySnapshot {
    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// True when the data may be served without refetching.
    pub fn is_fresh(&self, stale_time: Duration) -> bool {
        if self.invalidated || self.data.is_none() {
            return false;
        }
        match self.data_updated_at {
            Some(at) => at.elapsed() < stale_time,
            None => false,
        }
    }

    /// Returns a typed clone of the cached value.
    pub fn data_as<T>(&self) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match &self.data {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| CacheError::TypeMismatch {
                    key: self.key.to_string(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }
}

impl std::fmt::Debug for EntrySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySnapshot")
            .field("key", &self.key)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("status", &self.status)
            .field("fetch_status", &self.fetch_status)
            .field("invalidated", &self.invalidated)
            .finish()
    }
}

/// What happened to a key, as broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Fetching,
    Updated,
    Failed,
    Invalidated,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
}
