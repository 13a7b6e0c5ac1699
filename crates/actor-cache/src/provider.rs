//! # Actor Handle Provider
//!
//! Produces the handle used to call the remote backend, lazily and once per
//! identity. The handle lives in the cache under [`QueryKey::actor`], so its
//! loading/ready/errored state is just the state of that entry and the
//! readiness observer and ready-wait utility work on it like on any other key.
//!
//! ## Identity transitions
//!
//! [`ActorProvider::set_identity`] swaps the current principal. Entries scoped
//! to the previous identity are removed, everything else except actor handles
//! is invalidated, and the new identity's handle starts loading. A connection
//! that finishes after the switch lands on a removed entry and is discarded.

use crate::client::CacheClient;
use crate::entry::AnyValue;
use crate::error::{CacheError, SharedError, WaitError};
use crate::identity::Principal;
use crate::key::{KeyFilter, QueryKey};
use crate::readiness::{self, Readiness};
use crate::wait::{self, WaitOptions};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Builds a backend handle for an identity.
#[async_trait]
pub trait Connector<A>: Send + Sync + 'static {
    async fn connect(&self, identity: Option<Principal>) -> Result<A, SharedError>;
}

/// Lazily produces and caches the backend handle for the current identity.
pub struct ActorProvider<A> {
    cache: CacheClient,
    connector: Arc<dyn Connector<A>>,
    identity: Arc<watch::Sender<Option<Principal>>>,
    wait: WaitOptions,
}

impl<A> Clone for ActorProvider<A> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            connector: self.connector.clone(),
            identity: self.identity.clone(),
            wait: self.wait,
        }
    }
}

impl<A> ActorProvider<A>
where
    A: Clone + Send + Sync + 'static,
{
    pub fn new(cache: CacheClient, connector: Arc<dyn Connector<A>>, wait: WaitOptions) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            cache,
            connector,
            identity: Arc::new(identity),
            wait,
        }
    }

    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    pub fn identity(&self) -> Option<Principal> {
        self.identity.borrow().clone()
    }

    pub fn actor_key(&self) -> QueryKey {
        QueryKey::actor(self.identity().as_ref())
    }

    /// Read-only readiness of the current identity's handle.
    pub async fn readiness(&self) -> Result<Readiness, CacheError> {
        readiness::observe(&self.cache, &self.actor_key()).await
    }

    /// The ready handle of `identity`, if any. Never starts a connection.
    pub async fn current_for(&self, identity: Option<&Principal>) -> Result<Option<A>, CacheError> {
        match self.cache.peek(&QueryKey::actor(identity)).await? {
            Some(entry) if !entry.is_fetching() => entry.data_as::<A>(),
            _ => Ok(None),
        }
    }

    /// Starts connecting unless a connection is in flight or already settled.
    ///
    /// Returns `true` if this call started the connection.
    pub async fn ensure_started(&self) -> Result<bool, CacheError> {
        let identity = self.identity();
        let key = QueryKey::actor(identity.as_ref());
        let Some(ticket) = self.cache.try_begin_fetch(&key).await? else {
            return Ok(false);
        };

        info!(%key, ticket, "Connecting actor");
        let cache = self.cache.clone();
        let connector = self.connector.clone();
        tokio::spawn(async move {
            let result = connector
                .connect(identity)
                .await
                .map(|handle| Arc::new(handle) as AnyValue);
            if let Err(error) = &result {
                warn!(%key, error = %error, "Actor connection failed");
            }
            match cache.complete_fetch(&key, ticket, result).await {
                Ok(true) => debug!(%key, ticket, "Actor connection stored"),
                Ok(false) => debug!(%key, ticket, "Actor connection discarded"),
                Err(error) => warn!(%key, error = %error, "Cache unavailable for actor result"),
            }
        });
        Ok(true)
    }

    /// Drops a failed or stale handle and connects again.
    pub async fn restart(&self) -> Result<(), CacheError> {
        self.cache.invalidate(self.actor_key()).await?;
        self.ensure_started().await?;
        Ok(())
    }

    /// Returns a ready handle, connecting and waiting if necessary.
    ///
    /// The wait gives up with [`WaitError::Cancelled`] as soon as `cancel`
    /// completes; pass `std::future::pending()` to wait for the full timeout.
    /// After the wait the handle is read again from the cache for the identity
    /// the wait was started for, rather than reused from before the wait.
    pub async fn wait_until_ready<C>(&self, cancel: C) -> Result<A, WaitError>
    where
        C: Future,
    {
        let key = self.actor_key();
        if let Some(handle) = self.current_for(key.identity()).await? {
            return Ok(handle);
        }
        self.ensure_started().await?;
        wait::wait_for_ready_with_cancel(&self.cache, &key, self.wait, cancel).await?;
        self.ready_handle(&key).await
    }

    async fn ready_handle(&self, key: &QueryKey) -> Result<A, WaitError> {
        self.current_for(key.identity())
            .await?
            .ok_or_else(|| WaitError::HandleUnavailable(key.to_string()))
    }

    /// Switches to a new identity (login, logout, or account switch).
    #[instrument(skip(self))]
    pub async fn set_identity(&self, next: Option<Principal>) -> Result<(), CacheError> {
        let previous = self.identity();
        if previous == next {
            return Ok(());
        }

        self.identity.send_replace(next.clone());

        let removed = match &previous {
            Some(_) => self.cache.remove(KeyFilter::Identity(previous.clone())).await?,
            None => self.cache.remove(QueryKey::actor(None)).await?,
        };
        let invalidated = self.cache.invalidate(KeyFilter::AllExceptActors).await?;
        info!(
            from = ?previous.as_ref().map(Principal::as_str),
            to = ?next.as_ref().map(Principal::as_str),
            removed,
            invalidated,
            "Identity changed"
        );

        self.ensure_started().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::CacheActor;
    use crate::mock::MockConnector;
    use std::future::pending;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct Handle(&'static str);

    fn provider(mock: &MockConnector<Handle>) -> ActorProvider<Handle> {
        let (actor, cache) = CacheActor::new(16);
        tokio::spawn(actor.run());
        ActorProvider::new(cache, Arc::new(mock.clone()), WaitOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_started_connects_once() {
        let mut mock = MockConnector::<Handle>::new();
        mock.expect_connect()
            .after(Duration::from_millis(200))
            .return_ok(Handle("anon"));
        let provider = provider(&mock);

        assert!(provider.ensure_started().await.unwrap());
        assert!(!provider.ensure_started().await.unwrap());
        assert!(provider.readiness().await.unwrap().is_initializing);

        let handle = provider.wait_until_ready(pending::<()>()).await.unwrap();
        assert_eq!(handle, Handle("anon"));
        assert!(!provider.ensure_started().await.unwrap());
        assert_eq!(mock.connect_count(), 1);
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_switch_drops_old_scope() {
        let mut mock = MockConnector::<Handle>::new();
        mock.expect_connect().return_ok(Handle("alice"));
        mock.expect_connect().return_ok(Handle("bob"));
        let provider = provider(&mock);
        let cache = provider.cache().clone();

        let alice = Principal::new("alice");
        provider.set_identity(Some(alice.clone())).await.unwrap();
        assert_eq!(provider.wait_until_ready(pending::<()>()).await.unwrap(), Handle("alice"));

        let incidents = QueryKey::new("userIncidents").with_identity(alice.clone());
        let evidence = QueryKey::new("incidentEvidence").with_param(1);
        cache.set_data(&incidents, vec![1u32]).await.unwrap();
        cache.set_data(&evidence, vec![9u32]).await.unwrap();

        provider
            .set_identity(Some(Principal::new("bob")))
            .await
            .unwrap();

        assert!(cache.peek(&incidents).await.unwrap().is_none());
        assert!(cache.peek(&QueryKey::actor(Some(&alice))).await.unwrap().is_none());
        assert!(cache.peek(&evidence).await.unwrap().unwrap().invalidated);
        assert_eq!(provider.wait_until_ready(pending::<()>()).await.unwrap(), Handle("bob"));
        assert_eq!(
            mock.identities(),
            vec![Some(alice), Some(Principal::new("bob"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_connection_for_old_identity_is_discarded() {
        let mut mock = MockConnector::<Handle>::new();
        mock.expect_connect()
            .after(Duration::from_secs(2))
            .return_ok(Handle("alice"));
        mock.expect_connect().return_ok(Handle("anon"));
        let provider = provider(&mock);
        let alice = Principal::new("alice");

        provider.set_identity(Some(alice.clone())).await.unwrap();
        provider.set_identity(None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        let cache = provider.cache();
        assert!(cache.peek(&QueryKey::actor(Some(&alice))).await.unwrap().is_none());
        assert_eq!(provider.current_for(None).await.unwrap(), Some(Handle("anon")));
    }

    #[tokio::test]
    async fn test_handle_is_read_for_the_waited_identity() {
        let mock = MockConnector::<Handle>::new();
        let provider = provider(&mock);
        let cache = provider.cache();
        let alice = Principal::new("alice");
        let waited = QueryKey::actor(Some(&alice));
        cache.set_data(&waited, Handle("alice")).await.unwrap();
        cache.set_data(&QueryKey::actor(None), Handle("anon")).await.unwrap();

        // Current identity is anonymous; the re-read must not pick its handle
        assert_eq!(provider.ready_handle(&waited).await.unwrap(), Handle("alice"));

        cache.remove(waited.clone()).await.unwrap();
        assert!(matches!(
            provider.ready_handle(&waited).await,
            Err(WaitError::HandleUnavailable(key)) if key == "actor@alice"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_stops_early() {
        let mut mock = MockConnector::<Handle>::new();
        mock.expect_connect().never();
        let provider = provider(&mock);

        let (cancel, cancelled) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = cancel.send(());
        });

        let started = tokio::time::Instant::now();
        let result = provider.wait_until_ready(cancelled).await;
        assert!(matches!(result, Err(WaitError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_failure() {
        let mut mock = MockConnector::<Handle>::new();
        mock.expect_connect()
            .return_err(std::io::Error::other("boundary node unavailable"));
        mock.expect_connect().return_ok(Handle("anon"));
        let provider = provider(&mock);

        let first = provider.wait_until_ready(pending::<()>()).await;
        assert!(matches!(first, Err(WaitError::ActorFailed(_))));
        assert!(provider.readiness().await.unwrap().has_error);

        // A settled error is not retried implicitly
        assert!(!provider.ensure_started().await.unwrap());

        provider.restart().await.unwrap();
        assert_eq!(provider.wait_until_ready(pending::<()>()).await.unwrap(), Handle("anon"));
    }
}
