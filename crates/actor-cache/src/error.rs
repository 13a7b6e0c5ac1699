//! # Cache Errors
//!
//! Error types shared by the cache actor, its client and the ready-wait utility.
//! Fetch failures are stored in cache entries, so they are type-erased into
//! [`SharedError`] and can be handed to every reader of the entry.

use std::sync::Arc;
use std::time::Duration;

/// A cloneable, type-erased error as stored in a cache entry.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Wraps any error into a [`SharedError`].
pub fn share<E>(error: E) -> SharedError
where
    E: std::error::Error + Send + Sync + 'static,
{
    Arc::new(error)
}

/// Errors raised by the cache itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CacheError {
    #[error("Cache actor closed")]
    CacheClosed,
    #[error("Cache actor dropped response channel")]
    CacheDropped,
    #[error("Cached value for {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Ways a ready-wait can end without a ready actor handle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaitError {
    #[error("Actor not ready after {0:?}")]
    Timeout(Duration),
    #[error("Actor initialization failed: {0}")]
    ActorFailed(SharedError),
    #[error("Wait for actor cancelled")]
    Cancelled,
    /// The wait resolved but the handle was gone when re-read (e.g. the identity changed).
    #[error("Actor handle unavailable for {0}")]
    HandleUnavailable(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout(_))
    }
}
