//! # Ready-Wait Utility
//!
//! Turns "the actor handle is still being produced" into one awaitable step.
//! The entry is polled at a fixed interval until it is ready (resolve), has
//! failed (reject with the stored error) or the timeout elapses (reject with
//! [`WaitError::Timeout`]). A key with no entry yet is still waiting, not an
//! error: the fetch may simply not have been scheduled.

use crate::client::CacheClient;
use crate::error::{SharedError, WaitError};
use crate::key::QueryKey;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

enum Poll {
    Ready,
    Failed(SharedError),
    Waiting,
}

async fn poll_once(cache: &CacheClient, key: &QueryKey) -> Result<Poll, WaitError> {
    let Some(entry) = cache.peek(key).await? else {
        return Ok(Poll::Waiting);
    };
    if entry.is_fetching() {
        return Ok(Poll::Waiting);
    }
    if entry.has_data() {
        return Ok(Poll::Ready);
    }
    match (entry.is_error(), entry.error) {
        (true, Some(error)) => Ok(Poll::Failed(error)),
        _ => Ok(Poll::Waiting),
    }
}

/// Waits until the entry under `key` holds data and is not fetching.
pub async fn wait_for_ready(
    cache: &CacheClient,
    key: &QueryKey,
    options: WaitOptions,
) -> Result<(), WaitError> {
    let started = Instant::now();
    let deadline = started + options.timeout;
    let mut ticker = tokio::time::interval(options.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match poll_once(cache, key).await? {
            Poll::Ready => {
                debug!(%key, waited_ms = started.elapsed().as_millis() as u64, "Actor ready");
                return Ok(());
            }
            Poll::Failed(error) => {
                warn!(%key, error = %error, "Actor failed while waiting");
                return Err(WaitError::ActorFailed(error));
            }
            Poll::Waiting => {}
        }
        if Instant::now() >= deadline {
            warn!(%key, timeout_ms = options.timeout.as_millis() as u64, "Timed out waiting for actor");
            return Err(WaitError::Timeout(options.timeout));
        }
    }
}

/// [`wait_for_ready`] that also gives up as soon as `cancel` completes.
///
/// Pass e.g. a oneshot receiver owned by the component that started the
/// wait, so the poll loop stops when that component goes away.
pub async fn wait_for_ready_with_cancel<C>(
    cache: &CacheClient,
    key: &QueryKey,
    options: WaitOptions,
    cancel: C,
) -> Result<(), WaitError>
where
    C: Future,
{
    tokio::select! {
        result = wait_for_ready(cache, key, options) => result,
        _ = cancel => {
            debug!(%key, "Wait cancelled");
            Err(WaitError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::CacheActor;
    use crate::error::share;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_resolves_when_data_arrives() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let key = QueryKey::actor(None);

        let ticket = cache.begin_fetch(&key).await.unwrap();
        let producer = cache.clone();
        let producer_key = key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(750)).await;
            producer
                .complete_fetch(&producer_key, ticket, Ok(Arc::new(1u32)))
                .await
                .unwrap();
        });

        let started = Instant::now();
        wait_for_ready(&cache, &key, WaitOptions::default())
            .await
            .unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(750));
        assert!(waited <= Duration::from_millis(850));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entry_keeps_waiting_until_timeout() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());

        let started = Instant::now();
        let result = wait_for_ready(&cache, &QueryKey::actor(None), WaitOptions::default()).await;
        let waited = started.elapsed();

        assert!(matches!(result, Err(WaitError::Timeout(t)) if t == DEFAULT_WAIT_TIMEOUT));
        assert!(waited >= DEFAULT_WAIT_TIMEOUT);
        assert!(waited <= DEFAULT_WAIT_TIMEOUT + DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_with_stored_error() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let key = QueryKey::actor(None);

        let ticket = cache.begin_fetch(&key).await.unwrap();
        cache
            .complete_fetch(&key, ticket, Err(share(std::io::Error::other("replica down"))))
            .await
            .unwrap();

        let result = wait_for_ready(&cache, &key, WaitOptions::default()).await;
        match result {
            Err(WaitError::ActorFailed(error)) => assert!(error.to_string().contains("replica down")),
            other => panic!("Expected ActorFailed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_while_refetching_is_not_ready() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());
        let key = QueryKey::actor(None);

        let first = cache.begin_fetch(&key).await.unwrap();
        cache
            .complete_fetch(&key, first, Ok(Arc::new(1u32)))
            .await
            .unwrap();
        // Refetch in flight: the old handle must not be reported ready
        let _second = cache.begin_fetch(&key).await.unwrap();

        let result = wait_for_ready(
            &cache,
            &key,
            WaitOptions::default().with_timeout(Duration::from_millis(500)),
        )
        .await;
        assert!(matches!(result, Err(WaitError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_signal_stops_the_wait() {
        let (actor, cache) = CacheActor::new(8);
        tokio::spawn(actor.run());

        let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = cancel_tx.send(());
        });

        let started = Instant::now();
        let result = wait_for_ready_with_cancel(
            &cache,
            &QueryKey::actor(None),
            WaitOptions::default(),
            cancel_rx,
        )
        .await;
        assert!(matches!(result, Err(WaitError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
