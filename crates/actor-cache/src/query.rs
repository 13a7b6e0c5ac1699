//! # Query Runner
//!
//! The read half of the cache: given a key, an enabled predicate and a
//! staleness policy, either serve the cached value, run the fetcher and
//! store its result, or do nothing at all when the query is disabled.

use crate::client::CacheClient;
use crate::entry::AnyValue;
use crate::error::CacheError;
use crate::key::QueryKey;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How a query is keyed, gated and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub key: QueryKey,
    /// A disabled query never runs its fetcher.
    pub enabled: bool,
    /// How long fetched data may be served without refetching.
    pub stale_time: Duration,
    /// Refetch on every access, even if the data is still fresh.
    pub refetch_on_mount: bool,
}

impl QueryOptions {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            enabled: true,
            stale_time: Duration::ZERO,
            refetch_on_mount: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn refetch_on_mount(mut self, always: bool) -> Self {
        self.refetch_on_mount = always;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Disabled,
    Cached(T),
    Fetched(T),
}

impl<T> QueryOutcome<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            QueryOutcome::Disabled => None,
            QueryOutcome::Cached(data) | QueryOutcome::Fetched(data) => Some(data),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryOutcome::Disabled)
    }
}

/// Runs one query against the cache.
///
/// The fetch error is returned to the caller and a copy is stored in the
/// entry, so the error type must be cloneable. A result superseded by a newer
/// fetch or an invalidation is still returned, but not written to the cache.
pub async fn run_query<T, E, F, Fut>(
    cache: &CacheClient,
    options: QueryOptions,
    fetch: F,
) -> Result<QueryOutcome<T>, E>
where
    T: Clone + Send + Sync + 'static,
    E: std::error::Error + Clone + Send + Sync + From<CacheError> + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let key = options.key;
    if !options.enabled {
        debug!(%key, "Query disabled");
        return Ok(QueryOutcome::Disabled);
    }

    if !options.refetch_on_mount {
        if let Some(entry) = cache.peek(&key).await? {
            if entry.is_fresh(options.stale_time) {
                if let Some(data) = entry.data_as::<T>()? {
                    debug!(%key, "Query served from cache");
                    return Ok(QueryOutcome::Cached(data));
                }
            }
        }
    }

    let ticket = cache.begin_fetch(&key).await?;
    match fetch().await {
        Ok(data) => {
            let value: AnyValue = Arc::new(data.clone());
            cache.complete_fetch(&key, ticket, Ok(value)).await?;
            Ok(QueryOutcome::Fetched(data))
        }
        Err(error) => {
            cache
                .complete_fetch(&key, ticket, Err(Arc::new(error.clone())))
                .await?;
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::CacheActor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    enum TestError {
        #[error("remote: {0}")]
        Remote(String),
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    fn counted(
        calls: &Arc<AtomicUsize>,
        value: Vec<u32>,
    ) -> impl Future<Output = Result<Vec<u32>, TestError>> {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(value) }
    }

    #[tokio::test]
    async fn test_disabled_query_never_fetches() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("userIncidents");

        let outcome = run_query(&cache, QueryOptions::new(key.clone()).enabled(false), || {
            counted(&calls, vec![1])
        })
        .await
        .unwrap();

        assert!(outcome.is_disabled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.peek(&key).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_data_is_served_from_cache() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions::new(QueryKey::new("incidentSummary").with_param(1))
            .stale_time(Duration::from_secs(30));

        let first = run_query(&cache, options.clone(), || counted(&calls, vec![1]))
            .await
            .unwrap();
        assert_eq!(first, QueryOutcome::Fetched(vec![1]));

        let second = run_query(&cache, options.clone(), || counted(&calls, vec![2]))
            .await
            .unwrap();
        assert_eq!(second, QueryOutcome::Cached(vec![1]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let third = run_query(&cache, options, || counted(&calls, vec![3]))
            .await
            .unwrap();
        assert_eq!(third, QueryOutcome::Fetched(vec![3]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refetch_on_mount_always_fetches() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions::new(QueryKey::new("userIncidents"))
            .stale_time(Duration::from_secs(60))
            .refetch_on_mount(true);

        run_query(&cache, options.clone(), || counted(&calls, vec![1]))
            .await
            .unwrap();
        let again = run_query(&cache, options, || counted(&calls, vec![1, 2]))
            .await
            .unwrap();

        assert_eq!(again, QueryOutcome::Fetched(vec![1, 2]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidated_data_is_refetched() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("incidentEvidence").with_param(4);
        let options = QueryOptions::new(key.clone()).stale_time(Duration::from_secs(60));

        run_query(&cache, options.clone(), || counted(&calls, vec![1]))
            .await
            .unwrap();
        assert_eq!(cache.invalidate(key.clone()).await.unwrap(), 1);

        let outcome = run_query(&cache, options, || counted(&calls, vec![1, 2]))
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Fetched(vec![1, 2]));
        assert_eq!(cache.get_data::<Vec<u32>>(&key).await.unwrap(), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_fetch_error_is_stored_and_returned() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let key = QueryKey::new("journalEntries");

        let result: Result<QueryOutcome<Vec<u32>>, TestError> =
            run_query(&cache, QueryOptions::new(key.clone()), || async {
                Err(TestError::Remote("canister trapped".into()))
            })
            .await;

        assert_eq!(result, Err(TestError::Remote("canister trapped".into())));
        let entry = cache.peek(&key).await.unwrap().unwrap();
        assert!(entry.is_error());
        assert!(!entry.is_fetching());
        assert!(entry.error.unwrap().to_string().contains("canister trapped"));
    }
}
