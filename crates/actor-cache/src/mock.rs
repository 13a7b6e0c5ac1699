//! # Mocks & Testing Guide
//!
//! Two kinds of test doubles live here.
//!
//! [`MockConnector`] stands in for the real backend connector. Expectations
//! are consumed in order, one per `connect` call, and can be delayed or left
//! pending forever, which makes "the actor takes 750 ms to come up" or "the
//! actor never comes up" a one-liner under `start_paused` tokio tests.
//!
//! [`create_mock_cache`] hands out a [`CacheClient`] whose requests arrive on a
//! receiver you control, for testing code *around* the cache without running
//! the [`CacheActor`](crate::CacheActor).
//!
//! ## Testing Strategies
//!
//! | Pattern | Cache | Connector | Use Case |
//! |---------|-------|-----------|----------|
//! | Scripted cache | `create_mock_cache` | n/a | Exact request sequence of a helper |
//! | Real cache, mock connector | `CacheActor` | `MockConnector` | Readiness, waiting, identity switches |
//! | Full system | `CacheActor` | real backend fake | End-to-end flows |
//!
//! ```rust
//! use actor_cache::mock::MockConnector;
//! use actor_cache::{ActorProvider, CacheActor, WaitOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockConnector::<String>::new();
//!     mock.expect_connect().return_ok("handle".to_string());
//!
//!     let (actor, cache) = CacheActor::new(16);
//!     tokio::spawn(actor.run());
//!     let provider = ActorProvider::new(cache, Arc::new(mock.clone()), WaitOptions::default());
//!
//!     let handle = provider.wait_until_ready(std::future::pending::<()>()).await.unwrap();
//!     assert_eq!(handle, "handle");
//!     mock.verify();
//! }
//! ```

use crate::client::CacheClient;
use crate::entry::EntrySnapshot;
use crate::error::{share, CacheError, SharedError};
use crate::identity::Principal;
use crate::key::{KeyFilter, QueryKey};
use crate::message::CacheRequest;
use crate::provider::Connector;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// MOCK CONNECTOR
// =============================================================================

enum Response<A> {
    Ok(A),
    Err(SharedError),
    Never,
}

struct Expectation<A> {
    delay: Option<Duration>,
    response: Response<A>,
}

#[derive(Debug, thiserror::Error)]
#[error("unexpected connect call for {identity:?}")]
struct UnexpectedConnect {
    identity: Option<Principal>,
}

struct State<A> {
    expectations: VecDeque<Expectation<A>>,
    identities: Vec<Option<Principal>>,
}

/// A [`Connector`] with scripted responses.
///
/// Clones share expectations and the call log, so keep one clone in the test
/// and hand another to the code under test.
pub struct MockConnector<A> {
    state: Arc<Mutex<State<A>>>,
}

impl<A> Clone for MockConnector<A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<A> Default for MockConnector<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> MockConnector<A> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                expectations: VecDeque::new(),
                identities: Vec::new(),
            })),
        }
    }

    /// Expects one more `connect` call.
    pub fn expect_connect(&mut self) -> ConnectExpectationBuilder<A> {
        ConnectExpectationBuilder {
            delay: None,
            state: self.state.clone(),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().identities.len()
    }

    /// Identities passed to `connect`, in call order.
    pub fn identities(&self) -> Vec<Option<Principal>> {
        self.state.lock().unwrap().identities.clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            panic!(
                "Not all connect expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

#[async_trait]
impl<A> Connector<A> for MockConnector<A>
where
    A: Send + 'static,
{
    async fn connect(&self, identity: Option<Principal>) -> Result<A, SharedError> {
        let expectation = {
            let mut state = self.state.lock().unwrap();
            state.identities.push(identity.clone());
            state.expectations.pop_front()
        };
        let Some(expectation) = expectation else {
            return Err(share(UnexpectedConnect { identity }));
        };
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        match expectation.response {
            Response::Ok(handle) => Ok(handle),
            Response::Err(error) => Err(error),
            Response::Never => std::future::pending().await,
        }
    }
}

/// Builder for `connect` expectations.
pub struct ConnectExpectationBuilder<A> {
    delay: Option<Duration>,
    state: Arc<Mutex<State<A>>>,
}

impl<A> ConnectExpectationBuilder<A> {
    /// Delays the response.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn return_ok(self, handle: A) {
        self.push(Response::Ok(handle));
    }

    pub fn return_err<E>(self, error: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.push(Response::Err(share(error)));
    }

    /// The connection never completes.
    pub fn never(self) {
        self.push(Response::Never);
    }

    fn push(self, response: Response<A>) {
        let mut state = self.state.lock().unwrap();
        state.expectations.push_back(Expectation {
            delay: self.delay,
            response,
        });
    }
}

// =============================================================================
// SCRIPTED CACHE HELPERS
// =============================================================================

/// Creates a cache client and the receiver its requests arrive on.
pub fn create_mock_cache(buffer_size: usize) -> (CacheClient, mpsc::Receiver<CacheRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CacheClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Peek request
pub async fn expect_peek(
    receiver: &mut mpsc::Receiver<CacheRequest>,
) -> Option<(
    QueryKey,
    oneshot::Sender<Result<Option<EntrySnapshot>, CacheError>>,
)> {
    match receiver.recv().await {
        Some(CacheRequest::Peek { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Invalidate request
pub async fn expect_invalidate(
    receiver: &mut mpsc::Receiver<CacheRequest>,
) -> Option<(KeyFilter, oneshot::Sender<Result<usize, CacheError>>)> {
    match receiver.recv().await {
        Some(CacheRequest::Invalidate { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}
