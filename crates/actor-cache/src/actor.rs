//! # Cache Actor
//!
//! This module defines the `CacheActor`, the single owner of the query cache.
//! It implements the "Server" side of the Actor Model: every read, write,
//! invalidation and fetch bookkeeping step is a message processed in order,
//! so cache mutations never interleave.

use crate::client::CacheClient;
use crate::entry::{
    AnyValue, CacheEvent, CacheEventKind, EntrySnapshot, FetchStatus, QueryStatus, Ticket,
};
use crate::error::SharedError;
use crate::key::{KeyFilter, QueryKey};
use crate::message::CacheRequest;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 256;

struct Entry {
    data: Option<AnyValue>,
    error: Option<SharedError>,
    status: QueryStatus,
    fetch_status: FetchStatus,
    invalidated: bool,
    data_updated_at: Option<Instant>,
}

impl Entry {
    fn pending() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Pending,
            fetch_status: FetchStatus::Idle,
            invalidated: false,
            data_updated_at: None,
        }
    }

    fn snapshot(&self, key: &QueryKey) -> EntrySnapshot {
        EntrySnapshot {
            key: key.clone(),
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            fetch_status: self.fetch_status,
            invalidated: self.invalidated,
            data_updated_at: self.data_updated_at,
        }
    }

    fn store(&mut self, value: Option<AnyValue>) {
        match value {
            Some(value) => {
                self.data = Some(value);
                self.error = None;
                self.status = QueryStatus::Success;
                self.data_updated_at = Some(Instant::now());
            }
            None => {
                self.data = None;
                self.status = if self.error.is_some() {
                    QueryStatus::Error
                } else {
                    QueryStatus::Pending
                };
                self.data_updated_at = None;
            }
        }
        self.invalidated = false;
    }

    /// Whether `TryBeginFetch` should leave this entry alone.
    fn is_settled(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
            || (!self.invalidated && (self.data.is_some() || self.status == QueryStatus::Error))
    }
}

/// The actor that owns every cache entry.
///
/// # Architecture Note
/// The store lives inside the actor task and is only touched while a message
/// is being handled, so no `Mutex` is needed. Fetch results are fenced: each
/// fetch or fenced write takes a ticket, and only the holder of the latest
/// ticket for a key may write its result. Unfenced writes (`SetData` without
/// a ticket, `Update`) take a fresh ticket themselves, so an optimistic value
/// is never overwritten by a fetch that started before it.
pub struct CacheActor {
    receiver: mpsc::Receiver<CacheRequest>,
    entries: HashMap<QueryKey, Entry>,
    latest: HashMap<QueryKey, Ticket>,
    next_ticket: Ticket,
    events: broadcast::Sender<CacheEvent>,
}

impl CacheActor {
    /// Creates a new `CacheActor` and its associated `CacheClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full,
    /// client calls wait until there is space.
    pub fn new(buffer_size: usize) -> (Self, CacheClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let actor = Self {
            receiver,
            entries: HashMap::new(),
            latest: HashMap::new(),
            next_ticket: 1,
            events,
        };
        (actor, CacheClient::new(sender))
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!("Cache actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Peek { key, respond_to } => {
                    let snapshot = self.entries.get(&key).map(|entry| entry.snapshot(&key));
                    let _ = respond_to.send(Ok(snapshot));
                }
                CacheRequest::BeginFetch { key, respond_to } => {
                    let ticket = self.begin_fetch(key);
                    let _ = respond_to.send(Ok(ticket));
                }
                CacheRequest::TryBeginFetch { key, respond_to } => {
                    let settled = self.entries.get(&key).is_some_and(Entry::is_settled);
                    let ticket = if settled {
                        debug!(%key, "Fetch not started, entry settled or in flight");
                        None
                    } else {
                        Some(self.begin_fetch(key))
                    };
                    let _ = respond_to.send(Ok(ticket));
                }
                CacheRequest::CompleteFetch {
                    key,
                    ticket,
                    result,
                    respond_to,
                } => {
                    let applied = self.complete_fetch(key, ticket, result);
                    let _ = respond_to.send(Ok(applied));
                }
                CacheRequest::IssueTicket { key, respond_to } => {
                    let ticket = self.supersede(&key);
                    debug!(%key, ticket, "Ticket issued");
                    let _ = respond_to.send(Ok(ticket));
                }
                CacheRequest::SetData {
                    key,
                    value,
                    ticket,
                    respond_to,
                } => {
                    let applied = self.set_data(key, value, ticket);
                    let _ = respond_to.send(Ok(applied));
                }
                CacheRequest::Update {
                    key,
                    update,
                    respond_to,
                } => {
                    let previous = self.entries.get(&key).and_then(|entry| entry.data.clone());
                    let next = update(previous.as_ref());
                    if next.is_some() || self.entries.contains_key(&key) {
                        let ticket = self.supersede(&key);
                        self.entries
                            .entry(key.clone())
                            .or_insert_with(Entry::pending)
                            .store(next);
                        debug!(%key, ticket, "Updated in place");
                        self.emit(key, CacheEventKind::Updated);
                    }
                    let _ = respond_to.send(Ok(previous));
                }
                CacheRequest::Invalidate { filter, respond_to } => {
                    let count = self.invalidate(&filter);
                    let _ = respond_to.send(Ok(count));
                }
                CacheRequest::Remove { filter, respond_to } => {
                    let count = self.remove(&filter);
                    let _ = respond_to.send(Ok(count));
                }
                CacheRequest::Keys { respond_to } => {
                    let _ = respond_to.send(Ok(self.entries.keys().cloned().collect()));
                }
                CacheRequest::Subscribe { respond_to } => {
                    let _ = respond_to.send(Ok(self.events.subscribe()));
                }
            }
        }

        info!(size = self.entries.len(), "Cache actor shutdown");
    }

    fn issue_ticket(&mut self, key: &QueryKey) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.latest.insert(key.clone(), ticket);
        ticket
    }

    /// Takes a new ticket for a write, so fetches started earlier cannot
    /// overwrite it.
    fn supersede(&mut self, key: &QueryKey) -> Ticket {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.fetch_status = FetchStatus::Idle;
        }
        self.issue_ticket(key)
    }

    fn is_latest(&self, key: &QueryKey, ticket: Ticket) -> bool {
        self.latest.get(key) == Some(&ticket)
    }

    fn begin_fetch(&mut self, key: QueryKey) -> Ticket {
        let ticket = self.issue_ticket(&key);
        let entry = self.entries.entry(key.clone()).or_insert_with(Entry::pending);
        entry.fetch_status = FetchStatus::Fetching;
        debug!(%key, ticket, "Fetch started");
        self.emit(key, CacheEventKind::Fetching);
        ticket
    }

    fn complete_fetch(
        &mut self,
        key: QueryKey,
        ticket: Ticket,
        result: Result<AnyValue, SharedError>,
    ) -> bool {
        if !self.is_latest(&key, ticket) {
            debug!(%key, ticket, "Superseded fetch result discarded");
            return false;
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            debug!(%key, ticket, "Fetch result for removed entry discarded");
            return false;
        };
        entry.fetch_status = FetchStatus::Idle;
        let kind = match result {
            Ok(value) => {
                entry.store(Some(value));
                debug!(%key, ticket, "Fetch ok");
                CacheEventKind::Updated
            }
            Err(error) => {
                debug!(%key, ticket, error = %error, "Fetch failed");
                entry.error = Some(error);
                entry.status = QueryStatus::Error;
                entry.invalidated = false;
                CacheEventKind::Failed
            }
        };
        self.emit(key, kind);
        true
    }

    fn set_data(&mut self, key: QueryKey, value: AnyValue, ticket: Option<Ticket>) -> bool {
        match ticket {
            Some(ticket) if !self.is_latest(&key, ticket) => {
                debug!(%key, ticket, "Superseded write discarded");
                return false;
            }
            Some(_) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.fetch_status = FetchStatus::Idle;
                }
            }
            None => {
                self.supersede(&key);
            }
        }
        self.entries
            .entry(key.clone())
            .or_insert_with(Entry::pending)
            .store(Some(value));
        debug!(%key, ?ticket, "Data set");
        self.emit(key, CacheEventKind::Updated);
        true
    }

    fn invalidate(&mut self, filter: &KeyFilter) -> usize {
        let keys: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|key| filter.matches(key))
            .cloned()
            .collect();
        for key in &keys {
            let in_flight = match self.entries.get_mut(key) {
                Some(entry) => {
                    entry.invalidated = true;
                    let in_flight = entry.fetch_status == FetchStatus::Fetching;
                    entry.fetch_status = FetchStatus::Idle;
                    in_flight
                }
                None => false,
            };
            if in_flight {
                // Results of fetches started before the invalidation are stale.
                self.issue_ticket(key);
            }
            self.emit(key.clone(), CacheEventKind::Invalidated);
        }
        debug!(?filter, count = keys.len(), "Invalidated");
        keys.len()
    }

    fn remove(&mut self, filter: &KeyFilter) -> usize {
        let keys: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|key| filter.matches(key))
            .cloned()
            .collect();
        self.latest.retain(|key, _| !filter.matches(key));
        for key in &keys {
            self.entries.remove(key);
            self.emit(key.clone(), CacheEventKind::Removed);
        }
        debug!(?filter, count = keys.len(), size = self.entries.len(), "Removed");
        keys.len()
    }

    fn emit(&self, key: QueryKey, kind: CacheEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(CacheEvent { key, kind });
    }
}
