//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a `tracing-subscriber` formatter for binaries and demos that
//! embed the gateway. The library itself only emits events; it never installs a
//! subscriber on its own.
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle** (`info`): `Actor started`, `Shutdown` with the number of handled
//!   messages.
//! - **Requests** (`debug`): `Dispatch` with method, URL and correlation key, `Completed`
//!   with the status.
//! - **Streams and sockets** (`info`): opened / closed, plus each data event at `debug`.
//! - **Problems** (`warn`): transport failures, dead letters, unhandled messages.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Every request and stream event
//! RUST_LOG=debug cargo run
//!
//! # Just the dispatcher
//! RUST_LOG=actor_http::dispatcher=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a single pipe round trip looks like:
//!
//! ```text
//! DEBUG Receive actor="pipe" kind="Envelope" sender=Some(ActorRef(app#1))
//! DEBUG Submit actor=pipe submitted=1
//! DEBUG dispatch: Dispatch key="example.test" url=http://example.test/ok method=GET recipient=pipe
//! DEBUG Completed key="example.test" status=200
//! DEBUG Receive actor="pipe" kind="Envelope" sender=Some(ActorRef(pipe#2))
//! DEBUG Forward actor=pipe parent=app key="example.test"
//! ```

/// Initializes the global subscriber: `RUST_LOG` filtering, compact output, no targets.
///
/// Panics if a global subscriber is already installed, so call it once from `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
