//! # Clients
//!
//! One client per backend entity. Each wraps a [`Session`](crate::session::Session)
//! and exposes two kinds of calls:
//!
//! - **reads** that go through the query cache and degrade to an empty value
//!   while the backend handle, the identity or a required id is missing;
//! - **writes** that wait for a ready handle, make exactly one remote call and
//!   then invalidate (or optimistically update) the cache entries they affect.
//!
//! Clients are cheap to clone; all clones share the same cache and provider.

pub mod evidence_client;
pub mod incident_client;
pub mod journal_client;
pub mod media_client;
pub mod message_client;
pub mod police_client;
pub mod profile_client;
pub mod stalker_client;
pub mod submission_client;
pub mod victim_client;

pub use evidence_client::EvidenceClient;
pub use incident_client::IncidentClient;
pub use journal_client::JournalClient;
pub use media_client::MediaClient;
pub use message_client::MessageClient;
pub use police_client::PoliceClient;
pub use profile_client::ProfileClient;
pub use stalker_client::StalkerClient;
pub use submission_client::SubmissionClient;
pub use victim_client::VictimClient;
