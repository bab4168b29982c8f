//! # WebSocket Client
//!
//! A duplex text connection whose lifecycle is reported through a [`WebSocketHandler`].
//! [`ActorSocketHandler`] routes those callbacks into an actor's mailbox as
//! [`SocketEvent`](crate::message::SocketEvent)s.
//!
//! ```ignore
//! let (actor, handle) = spawn_actor(MyActor::default(), "ws-consumer", 32, None);
//! let handler = ActorSocketHandler::new(actor);
//! let client = WebSocketClient::connect("ws://127.0.0.1:9001", handler).await?;
//! client.send("hello").await?;
//! client.close().await;
//! ```

pub mod client;
pub mod error;
pub mod handler;

pub use client::{WebSocketClient, CLOSE_TIMEOUT};
pub use error::DuplexError;
pub use handler::{ActorSocketHandler, CloseReason, SocketSession, WebSocketHandler};
