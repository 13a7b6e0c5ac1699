//! # ReportHer Client
//!
//! The client-side coordination layer of ReportHer, a personal-safety
//! service for documenting harassment and stalking. It sits between the user
//! interface and the remote backend actor and decides *when* a backend call
//! may be made and what happens to the cached results afterwards.
//!
//! ## Core Components
//!
//! - **[backend]**: the RPC contract of the backend actor ([`ReportHerBackend`](backend::ReportHerBackend))
//!   and an in-memory implementation for tests and the demo.
//! - **[session]**: the read and write conventions shared by every client.
//! - **[clients]**: one client per entity (incidents, evidence, journal, ...).
//! - **[journal]**: journal keyword flagging and the self-service permission probe.
//! - **[quick_exit]**: the device-local quick-exit URL.
//! - **[lifecycle]**: [`ReportHerApp`](lifecycle::ReportHerApp), which wires it all together.
//!
//! The cache, the backend handle provider and the ready-wait utility live in
//! the [`actor_cache`] crate.
//!
//! ## Reads and writes
//!
//! Reads never block on the backend: until the handle for the current
//! identity is ready they return an empty value and start the connection.
//! Writes wait for the handle (ten seconds by default) and fail with a typed
//! [`AppError`](error::AppError) when it does not come up, without calling
//! the backend.
//!
//! ## Quick Start
//!
//! The binary in `main.rs` runs a complete session against the in-memory
//! backend: login, an incident report, a journal entry and a police
//! submission.

pub mod backend;
pub mod clients;
pub mod config;
pub mod error;
pub mod journal;
pub mod keys;
pub mod lifecycle;
pub mod model;
pub mod quick_exit;
pub mod session;
pub mod validate;
