//! # Actor Cache
//!
//! An async query cache built as an actor, plus the coordination layer that
//! lets an application talk to a remote backend only through a lazily created,
//! identity-bound **actor handle**.
//!
//! ## Why an actor?
//!
//! The cache is shared by every component of the application: queries read and
//! fill it, mutations invalidate it, identity changes wipe parts of it. Putting
//! the store inside a single task that processes one message at a time gives:
//!
//! - Isolated state (no shared memory, no locks)
//! - A total order on writes, so fetch-result fencing is a simple ticket compare
//! - Cheap, cloneable [`CacheClient`] handles for every component
//!
//! **Further Reading**:
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Store Layer** ([`CacheActor`]) - entries keyed by [`QueryKey`], fetch tickets, events
//! 2. **Interface Layer** ([`CacheClient`]) - typed reads/writes, invalidation, subscriptions
//! 3. **Coordination Layer** - [`ActorProvider`] produces the backend handle,
//!    [`readiness::observe`] reports its state and [`wait::wait_for_ready`]
//!    turns "still initializing" into one awaitable step
//! 4. **Query Layer** ([`run_query`]) - enabled gating, staleness, fetch bookkeeping
//!
//! ## Quick Start
//!
//! ```rust
//! use actor_cache::{CacheActor, QueryKey, QueryOptions, QueryOutcome, run_query, CacheError};
//!
//! #[derive(Debug, Clone, thiserror::Error)]
//! enum AppError {
//!     #[error(transparent)]
//!     Cache(#[from] CacheError),
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, cache) = CacheActor::new(32);
//!     tokio::spawn(actor.run());
//!
//!     let options = QueryOptions::new(QueryKey::new("policeDepartments"));
//!     let outcome = run_query(&cache, options, || async {
//!         Ok::<_, AppError>(vec!["Central Precinct".to_string()])
//!     })
//!     .await
//!     .unwrap();
//!
//!     assert!(matches!(outcome, QueryOutcome::Fetched(_)));
//! }
//! ```
//!
//! ## Fencing
//!
//! Every fetch takes a [`Ticket`]. Only the latest ticket issued for a key may
//! write its result; an invalidation during a fetch issues a newer ticket, so
//! does a direct write such as an optimistic update, and removing an entry
//! forgets its tickets. A slow response therefore can never overwrite fresher
//! data or resurrect data removed on logout.
//!
//! ## Testing
//!
//! See [`mock`] for the scripted connector and cache helpers. Time-dependent
//! tests run under `#[tokio::test(start_paused = true)]`.

pub mod actor;
pub mod client;
pub mod entry;
pub mod error;
pub mod identity;
pub mod key;
pub mod message;
pub mod mock;
pub mod provider;
pub mod query;
pub mod readiness;
pub mod wait;

pub use actor::CacheActor;
pub use client::CacheClient;
pub use entry::{
    AnyValue, CacheEvent, CacheEventKind, EntrySnapshot, FetchStatus, QueryStatus, Ticket,
};
pub use error::{share, CacheError, SharedError, WaitError};
pub use identity::Principal;
pub use key::{KeyFilter, QueryKey, ACTOR_SCOPE};
pub use provider::{ActorProvider, Connector};
pub use query::{run_query, QueryOptions, QueryOutcome};
pub use readiness::Readiness;
pub use wait::{WaitOptions, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
