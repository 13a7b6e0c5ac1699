//! # Cache Messages
//!
//! The requests a [`CacheClient`](crate::CacheClient) sends to the
//! [`CacheActor`](crate::CacheActor). Each request carries a oneshot sender
//! for its reply, exactly like a resource request to any other actor.

use crate::entry::{AnyValue, CacheEvent, EntrySnapshot, Ticket};
use crate::error::{CacheError, SharedError};
use crate::key::{KeyFilter, QueryKey};
use tokio::sync::{broadcast, oneshot};

/// Type alias for the one-shot response channel used by the cache actor.
pub type Response<T> = oneshot::Sender<Result<T, CacheError>>;

/// A read-modify-write applied atomically inside the actor.
pub type UpdateFn = Box<dyn FnOnce(Option<&AnyValue>) -> Option<AnyValue> + Send>;

pub enum CacheRequest {
    /// Read one entry without creating it.
    Peek {
        key: QueryKey,
        respond_to: Response<Option<EntrySnapshot>>,
    },
    /// Start a fetch: create the entry if needed, mark it fetching, issue a ticket.
    BeginFetch {
        key: QueryKey,
        respond_to: Response<Ticket>,
    },
    /// Like `BeginFetch`, but only if nothing is in flight and the entry holds
    /// no current value or error.
    TryBeginFetch {
        key: QueryKey,
        respond_to: Response<Option<Ticket>>,
    },
    /// Store a fetch result if `ticket` is still the latest for the key.
    CompleteFetch {
        key: QueryKey,
        ticket: Ticket,
        result: Result<AnyValue, SharedError>,
        respond_to: Response<bool>,
    },
    /// Issue a ticket for a mutation; fetches in flight for the key are superseded.
    IssueTicket {
        key: QueryKey,
        respond_to: Response<Ticket>,
    },
    /// Write a value directly; with a ticket, only if it is still the latest.
    SetData {
        key: QueryKey,
        value: AnyValue,
        ticket: Option<Ticket>,
        respond_to: Response<bool>,
    },
    /// Replace the value with `update(current)`; replies with the previous value.
    Update {
        key: QueryKey,
        update: UpdateFn,
        respond_to: Response<Option<AnyValue>>,
    },
    /// Mark matching entries stale; replies with how many were touched.
    Invalidate {
        filter: KeyFilter,
        respond_to: Response<usize>,
    },
    /// Drop matching entries; replies with how many were removed.
    Remove {
        filter: KeyFilter,
        respond_to: Response<usize>,
    },
    Keys {
        respond_to: Response<Vec<QueryKey>>,
    },
    Subscribe {
        respond_to: Response<broadcast::Receiver<CacheEvent>>,
    },
}

impl std::fmt::Debug for CacheRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheRequest::Peek { key, .. } => write!(f, "Peek({})", key),
            CacheRequest::BeginFetch { key, .. } => write!(f, "BeginFetch({})", key),
            CacheRequest::TryBeginFetch { key, .. } => write!(f, "TryBeginFetch({})", key),
            CacheRequest::CompleteFetch { key, ticket, .. } => {
                write!(f, "CompleteFetch({}, ticket={})", key, ticket)
            }
            CacheRequest::IssueTicket { key, .. } => write!(f, "IssueTicket({})", key),
            CacheRequest::SetData { key, ticket, .. } => {
                write!(f, "SetData({}, ticket={:?})", key, ticket)
            }
            CacheRequest::Update { key, .. } => write!(f, "Update({})", key),
            CacheRequest::Invalidate { filter, .. } => write!(f, "Invalidate({:?})", filter),
            CacheRequest::Remove { filter, .. } => write!(f, "Remove({:?})", filter),
            CacheRequest::Keys { .. } => write!(f, "Keys"),
            CacheRequest::Subscribe { .. } => write!(f, "Subscribe"),
        }
    }
}
