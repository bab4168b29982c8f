//! # actor-http
//!
//! > **Asynchronous HTTP, server-sent events and WebSockets for tokio actors.**
//!
//! Actors process one message at a time and must never block on I/O. This crate lets an
//! actor ask for an HTTP call and carry on; the outcome comes back later as an ordinary
//! message in its mailbox, correlated with the request that caused it.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Everything is a message
//! A request goes out in an [`Envelope`] and the *same* envelope comes back with either a
//! response or a failure recorded in it. Streams arrive as `StreamStart`, `StreamData`,
//! `StreamEnd` / `StreamFailure`. WebSocket callbacks arrive as `Socket` events. Every
//! mailbox carries the one closed [`Message`] type, so handlers match exhaustively.
//!
//! ### Declared senders
//! Each delivery names who sent it ([`framework::Delivery`]). The gateway uses this to let
//! recipients tell "the request I just made came back" from "someone handed me a request",
//! which is what the [`pipe_actor`] relies on.
//!
//! ### One transport per process
//! The connection pool, cookie jar and timeouts live in a single [`transport::Transport`]
//! built at start-up from a [`transport::TransportConfig`] and shared as an
//! `Arc<dyn Transport>`.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Runtime ([`framework`])
//! A minimal actor runtime: [`ActorRef`](framework::ActorRef), the [`Actor`](framework::Actor)
//! trait and the [`ActorCell`](framework::ActorCell) message loop. The [`framework::mock`]
//! module provides mock actors for tests.
//!
//! ### 2. The Messages ([`message`], [`envelope`], [`model`])
//! What travels between actors, plus the request and response values.
//!
//! ### 3. The Plumbing ([`transport`])
//! The [`Transport`](transport::Transport) trait, its reqwest implementation, the SSE parser
//! and a scripted mock.
//!
//! ### 4. The Gateway ([`dispatcher`], [`pipe_actor`], [`stream`], [`websocket`])
//! - [`HttpDispatcher`](dispatcher::HttpDispatcher) runs an envelope and delivers it back.
//! - [`HttpPipeActor`](pipe_actor::HttpPipeActor) does the same on behalf of its parent.
//! - [`StreamListener`](stream::StreamListener) fans a stream out to consumer and owner.
//! - [`WebSocketClient`](websocket::WebSocketClient) reports socket callbacks to a handler.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`GatewaySystem`](lifecycle::GatewaySystem) wires it all together and shuts it down.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Fetch a page through a pipe actor, with request-level logs
//! RUST_LOG=debug cargo run -- https://example.com
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod dispatcher;
pub mod envelope;
pub mod framework;
pub mod lifecycle;
pub mod message;
pub mod model;
pub mod pipe_actor;
pub mod stream;
pub mod transport;
pub mod websocket;

pub use dispatcher::{GatewayError, HttpDispatcher};
pub use envelope::Envelope;
pub use message::Message;
