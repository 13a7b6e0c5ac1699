//! # Readiness Observer
//!
//! A read-only, derived view of the actor handle's cache entry. Observing
//! never starts a fetch and never writes to the cache, so it is safe to call
//! as often as needed.

use crate::client::CacheClient;
use crate::entry::EntrySnapshot;
use crate::error::{CacheError, SharedError};
use crate::key::QueryKey;

#[derive(Debug, Clone)]
pub struct Readiness {
    pub is_ready: bool,
    pub is_initializing: bool,
    pub has_error: bool,
    pub error: Option<SharedError>,
}

impl Readiness {
    /// Derives readiness from an entry; a missing entry counts as initializing.
    pub fn from_entry(entry: Option<&EntrySnapshot>) -> Self {
        let Some(entry) = entry else {
            return Self {
                is_ready: false,
                is_initializing: true,
                has_error: false,
                error: None,
            };
        };
        let fetching = entry.is_fetching();
        let has_error = entry.is_error();
        Self {
            is_ready: entry.has_data() && !fetching,
            is_initializing: fetching || (!entry.has_data() && !has_error),
            has_error,
            error: if has_error { entry.error.clone() } else { None },
        }
    }
}

/// Reads the entry under `key` and derives its readiness.
pub async fn observe(cache: &CacheClient, key: &QueryKey) -> Result<Readiness, CacheError> {
    let entry = cache.peek(key).await?;
    Ok(Readiness::from_entry(entry.as_ref()))
}
