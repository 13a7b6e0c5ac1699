//! # Application Lifecycle
//!
//! [`ReportHerApp`] is the conductor: it starts the cache actor, builds the
//! backend handle provider on top of it and hands one [`Session`](crate::session::Session)
//! to every client.
//!
//! ## Wiring
//!
//! ```rust,ignore
//! let (cache_actor, cache) = CacheActor::new(config.cache_buffer);
//! let cache_handle = tokio::spawn(cache_actor.run());
//!
//! let provider = ActorProvider::new(cache, connector, config.wait_options());
//! let session = Session::new(provider);
//! let incident_client = IncidentClient::new(session.clone());
//! // ... one client per entity
//! ```
//!
//! Nothing connects at construction time. The first read, write or
//! [`ReportHerApp::login`] starts the connection for the current identity.
//!
//! ## Identity
//!
//! [`ReportHerApp::login`] and [`ReportHerApp::logout`] switch the identity of
//! the shared provider. Cached data of the previous principal is removed,
//! every other entry is marked stale, and the new identity's handle starts
//! connecting in the background.
//!
//! ## Graceful Shutdown
//!
//! 1. **Close the session** - writes still waiting for the handle fail with `ActorNotReady`
//! 2. **Drop all clients** - every client holds a cache sender through its session
//! 3. **Cache actor drains** - `receiver.recv()` returns `None` once the last sender is gone
//! 4. **Await completion** - bounded by [`SHUTDOWN_GRACE`]; background fetches
//!    still holding a sender after that are not waited for
//!
//! Tracing is configured by [`setup_tracing`](self::tracing::setup_tracing).

pub mod app;
pub mod tracing;

pub use app::*;
