//! Plain data exchanged with the backend. The backend owns every one of these
//! values; the client only mirrors them in the query cache.

/// Defines a `u64` identifier newtype with `From<u64>` and a prefixed `Display`.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

pub mod evidence;
pub mod http;
pub mod incident;
pub mod journal;
pub mod media;
pub mod message;
pub mod police;
pub mod profile;
pub mod stalker;
pub mod submission;
pub mod victim;

pub use evidence::*;
pub use http::*;
pub use incident::*;
pub use journal::*;
pub use media::*;
pub use message::*;
pub use police::*;
pub use profile::*;
pub use stalker::*;
pub use submission::*;
pub use victim::*;
