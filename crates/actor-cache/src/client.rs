//! # Cache Client
//!
//! The type-safe, cloneable interface to the [`CacheActor`](crate::CacheActor).

use crate::entry::{AnyValue, CacheEvent, EntrySnapshot, Ticket};
use crate::error::{CacheError, SharedError};
use crate::key::{KeyFilter, QueryKey};
use crate::message::CacheRequest;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// ## CacheClient
///
/// Forwards requests to the cache actor over an mpsc channel and awaits the
/// reply on a oneshot channel. Holds only a sender, so cloning is cheap and
/// every component of the application can keep its own copy.
///
/// Typed methods (`get_data`, `set_data`, `update_data`) downcast the
/// type-erased values; asking for the wrong type is a [`CacheError::TypeMismatch`].
#[derive(Clone, Debug)]
pub struct CacheClient {
    sender: mpsc::Sender<CacheRequest>,
}

impl CacheClient {
    pub fn new(sender: mpsc::Sender<CacheRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, CacheError>>) -> CacheRequest,
    ) -> Result<T, CacheError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CacheError::CacheClosed)?;
        response.await.map_err(|_| CacheError::CacheDropped)?
    }

    /// Reads an entry without creating it.
    pub async fn peek(&self, key: &QueryKey) -> Result<Option<EntrySnapshot>, CacheError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::Peek { key, respond_to })
            .await
    }

    pub async fn get_data<T>(&self, key: &QueryKey) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.peek(key).await? {
            Some(snapshot) => snapshot.data_as::<T>(),
            None => Ok(None),
        }
    }

    /// Writes a value (an optimistic update, or a value fetched out of band).
    ///
    /// The write supersedes every fetch of the key still in flight.
    pub async fn set_data<T>(&self, key: &QueryKey, value: T) -> Result<(), CacheError>
    where
        T: Send + Sync + 'static,
    {
        let key = key.clone();
        let value: AnyValue = Arc::new(value);
        self.request(|respond_to| CacheRequest::SetData {
            key,
            value,
            ticket: None,
            respond_to,
        })
        .await
        .map(|_| ())
    }

    /// Writes a value only if `ticket` is still the latest issued for the key.
    ///
    /// Returns `false` when a newer fetch or mutation superseded this one.
    pub async fn set_data_fenced<T>(
        &self,
        key: &QueryKey,
        ticket: Ticket,
        value: T,
    ) -> Result<bool, CacheError>
    where
        T: Send + Sync + 'static,
    {
        let key = key.clone();
        let value: AnyValue = Arc::new(value);
        self.request(|respond_to| CacheRequest::SetData {
            key,
            value,
            ticket: Some(ticket),
            respond_to,
        })
        .await
    }

    /// Atomically replaces the value with `update(current)` and returns the previous value.
    ///
    /// A value of another type is seen as absent. Returning `None` from
    /// `update` clears the entry's value. Like [`set_data`](Self::set_data),
    /// a write supersedes in-flight fetches.
    pub async fn update_data<T, F>(&self, key: &QueryKey, update: F) -> Result<Option<T>, CacheError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<T>) -> Option<T> + Send + 'static,
    {
        let key = key.clone();
        let previous = self
            .request(|respond_to| CacheRequest::Update {
                key,
                update: Box::new(move |current: Option<&AnyValue>| {
                    let typed = current.and_then(|value| value.downcast_ref::<T>().cloned());
                    update(typed).map(|value| Arc::new(value) as AnyValue)
                }),
                respond_to,
            })
            .await?;
        Ok(previous.and_then(|value| value.downcast_ref::<T>().cloned()))
    }

    /// Marks matching entries stale. Never creates entries.
    pub async fn invalidate(&self, filter: impl Into<KeyFilter>) -> Result<usize, CacheError> {
        let filter = filter.into();
        self.request(|respond_to| CacheRequest::Invalidate { filter, respond_to })
            .await
    }

    pub async fn remove(&self, filter: impl Into<KeyFilter>) -> Result<usize, CacheError> {
        let filter = filter.into();
        self.request(|respond_to| CacheRequest::Remove { filter, respond_to })
            .await
    }

    pub async fn begin_fetch(&self, key: &QueryKey) -> Result<Ticket, CacheError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::BeginFetch { key, respond_to })
            .await
    }

    /// Starts a fetch unless one is in flight or the entry already settled.
    pub async fn try_begin_fetch(&self, key: &QueryKey) -> Result<Option<Ticket>, CacheError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::TryBeginFetch { key, respond_to })
            .await
    }

    /// Records a fetch result. Returns `false` if the result was discarded.
    pub async fn complete_fetch(
        &self,
        key: &QueryKey,
        ticket: Ticket,
        result: Result<AnyValue, SharedError>,
    ) -> Result<bool, CacheError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::CompleteFetch {
            key,
            ticket,
            result,
            respond_to,
        })
        .await
    }

    /// Reserves the key for a mutation's result; see [`set_data_fenced`](Self::set_data_fenced).
    pub async fn issue_ticket(&self, key: &QueryKey) -> Result<Ticket, CacheError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::IssueTicket { key, respond_to })
            .await
    }

    pub async fn keys(&self) -> Result<Vec<QueryKey>, CacheError> {
        self.request(|respond_to| CacheRequest::Keys { respond_to })
            .await
    }

    pub async fn subscribe(&self) -> Result<broadcast::Receiver<CacheEvent>, CacheError> {
        self.request(|respond_to| CacheRequest::Subscribe { respond_to })
            .await
    }
}
