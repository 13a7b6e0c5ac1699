//! # Session
//!
//! The query and mutation conventions every client goes through.
//!
//! **Reads** ([`Session::read`]) are enabled only when the backend handle of
//! the current identity is ready, the identity is present for user-scoped
//! data, and every required id is known. A disabled read never reaches the
//! backend and degrades to the type's empty value (`Vec::new()`, `None`,
//! `false`). Backend failures of an enabled read are returned as errors.
//!
//! **Writes** ([`Session::mutate`], [`Session::mutation_actor`]) wait for a
//! ready handle first and fail with a typed [`AppError`] when it does not
//! come up; the remote call is never made in that case and never retried.
//! [`Session::close`] cancels every write still waiting.

use crate::backend::{BackendHandle, BackendResult};
use crate::error::AppError;
use actor_cache::{
    run_query, ActorProvider, CacheClient, KeyFilter, Principal, QueryKey, QueryOptions,
    Readiness,
};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub type BackendProvider = ActorProvider<BackendHandle>;

/// Declares one backend read: its cache scope, parameters and staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct Read {
    scope: &'static str,
    user_scoped: bool,
    params: Vec<String>,
    missing_param: bool,
    stale_time: Duration,
    refetch_on_mount: bool,
}

impl Read {
    /// A read of the caller's own data, keyed by their principal.
    pub fn user(scope: &'static str) -> Self {
        Self {
            user_scoped: true,
            ..Self::shared(scope)
        }
    }

    pub fn shared(scope: &'static str) -> Self {
        Self {
            scope,
            user_scoped: false,
            params: Vec::new(),
            missing_param: false,
            stale_time: Duration::ZERO,
            refetch_on_mount: false,
        }
    }

    pub fn param(mut self, param: impl Display) -> Self {
        self.params.push(param.to_string());
        self
    }

    /// A parameter the read cannot run without; `None` disables the read.
    pub fn required<P: Display>(self, param: Option<P>) -> Self {
        match param {
            Some(param) => self.param(param),
            None => Self {
                missing_param: true,
                ..self
            },
        }
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn refetch_on_mount(mut self) -> Self {
        self.refetch_on_mount = true;
        self
    }

    pub fn key(&self, identity: Option<&Principal>) -> QueryKey {
        let key = QueryKey::new(self.scope);
        let key = match (self.user_scoped, identity) {
            (true, Some(identity)) => key.with_identity(identity.clone()),
            _ => key,
        };
        self.params.iter().fold(key, |key, param| key.with_param(param))
    }
}

/// Shared access to the backend handle provider and the query cache.
#[derive(Clone)]
pub struct Session {
    provider: BackendProvider,
    closing: Arc<watch::Sender<bool>>,
}

impl Session {
    pub fn new(provider: BackendProvider) -> Self {
        let (closing, _) = watch::channel(false);
        Self {
            provider,
            closing: Arc::new(closing),
        }
    }

    /// Cancels writes waiting for the backend handle, now and later.
    pub fn close(&self) {
        if !self.closing.send_replace(true) {
            info!("Session closed");
        }
    }

    fn closed(&self) -> impl Future<Output = ()> {
        let mut closing = self.closing.subscribe();
        async move {
            let _ = closing.wait_for(|closed| *closed).await;
        }
    }

    pub fn provider(&self) -> &BackendProvider {
        &self.provider
    }

    pub fn cache(&self) -> &CacheClient {
        self.provider.cache()
    }

    pub fn identity(&self) -> Option<Principal> {
        self.provider.identity()
    }

    /// The current principal, or `AuthenticationRequired` for anonymous callers.
    pub fn require_identity(&self) -> Result<Principal, AppError> {
        self.identity().ok_or(AppError::AuthenticationRequired)
    }

    pub async fn readiness(&self) -> Result<Readiness, AppError> {
        Ok(self.provider.readiness().await?)
    }

    /// Runs `fetch` through the query cache if the read is enabled.
    pub async fn read<T, F, Fut>(&self, read: Read, fetch: F) -> Result<T, AppError>
    where
        T: Default + Clone + Send + Sync + 'static,
        F: FnOnce(BackendHandle) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let identity = self.identity();
        let handle = self.provider.current_for(identity.as_ref()).await?;
        let Some(handle) = handle else {
            self.provider.ensure_started().await?;
            debug!(scope = read.scope, "Read disabled, actor not ready");
            return Ok(T::default());
        };
        if read.user_scoped && identity.is_none() {
            debug!(scope = read.scope, "Read disabled, no identity");
            return Ok(T::default());
        }
        if read.missing_param {
            debug!(scope = read.scope, "Read disabled, missing parameter");
            return Ok(T::default());
        }

        let options = QueryOptions::new(read.key(identity.as_ref()))
            .stale_time(read.stale_time)
            .refetch_on_mount(read.refetch_on_mount);
        let outcome = run_query(self.cache(), options, move || async move {
            fetch(handle).await.map_err(AppError::from)
        })
        .await?;
        Ok(outcome.into_data().unwrap_or_default())
    }

    /// Refetches a read in a background task so its cache entry converges.
    pub fn refetch_in_background<T, F, Fut>(&self, read: Read, fetch: F)
    where
        T: Default + Clone + Send + Sync + 'static,
        F: FnOnce(BackendHandle) -> Fut + Send + 'static,
        Fut: Future<Output = BackendResult<T>> + Send + 'static,
    {
        let session = self.clone();
        tokio::spawn(async move {
            let scope = read.scope;
            if let Err(error) = session.read(read.refetch_on_mount(), fetch).await {
                warn!(scope, error = %error, "Background refetch failed");
            }
        });
    }

    /// A ready backend handle, waiting for it if necessary.
    ///
    /// The handle is read from the cache after the wait, never captured
    /// before it. The wait ends early once the session is closed.
    pub async fn mutation_actor(&self) -> Result<BackendHandle, AppError> {
        self.provider.wait_until_ready(self.closed()).await.map_err(|error| {
            warn!(error = %error, "Backend actor unavailable for mutation");
            AppError::from(error)
        })
    }

    /// Waits for a ready handle, then makes exactly one remote call with it.
    pub async fn mutate<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: FnOnce(BackendHandle) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let handle = self.mutation_actor().await?;
        info!(operation, "Calling backend");
        call(handle).await.map_err(|error| {
            warn!(operation, error = %error, "Backend call failed");
            AppError::from(error)
        })
    }

    pub async fn invalidate(&self, filter: impl Into<KeyFilter>) -> Result<usize, AppError> {
        let filter = filter.into();
        let count = self.cache().invalidate(filter.clone()).await?;
        debug!(?filter, count, "Invalidated after mutation");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_keys() {
        let alice = Principal::new("alice");
        let read = Read::user("userIncidents");
        assert_eq!(read.key(Some(&alice)).to_string(), "userIncidents@alice");

        let read = Read::shared("incidentEvidence").required(Some(7));
        assert_eq!(read.key(Some(&alice)).to_string(), "incidentEvidence/7");
        assert!(!read.missing_param);

        let read = Read::shared("incidentEvidence").required(None::<u64>);
        assert!(read.missing_param);
    }
}
