//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the `tracing` subscriber used by the binaries.
//! Output is the compact format without module targets; log levels come
//! from `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Cache Actor Lifecycle**: startup and shutdown with the final entry count
//! - **Client Lifecycle**: startup, login/logout and shutdown of [`ReportHerApp`](super::ReportHerApp)
//! - **Fetches**: start, result stored, result discarded by the ticket fence
//! - **Actor Handles**: connection attempts, identity changes, ready-waits and timeouts
//! - **Mutations**: remote writes with their cache invalidations
//!
//! ```bash
//! RUST_LOG=info cargo run -p reporther          # lifecycle and mutations
//! RUST_LOG=debug cargo run -p reporther         # every cache message
//! RUST_LOG=actor_cache=debug,info cargo run -p reporther
//! ```
//!
//! With `RUST_LOG=debug` a login looks like:
//!
//! ```text
//! INFO Identity changed from=None to=Some("2vxsx-fae") removed=1 invalidated=0
//! INFO Connecting actor key=actor@2vxsx-fae ticket=3
//! DEBUG Fetch started key=actor@2vxsx-fae ticket=3
//! DEBUG Fetch ok key=actor@2vxsx-fae ticket=3
//! DEBUG Actor ready key=actor@2vxsx-fae waited_ms=200
//! ```

/// Initializes the global subscriber.
///
/// Calling it again (e.g. from several tests) keeps the first subscriber.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        setup_tracing();
        setup_tracing();
    }
}
