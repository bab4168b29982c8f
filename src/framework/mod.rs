//! Minimal actor runtime the gateway delivers into.
//!
//! # Main Components
//!
//! - [`ActorRef`] - Identity plus mailbox; the "deliver to named recipient" capability
//! - [`Actor`] / [`ActorCell`] - Behaviour trait and its sequential run loop
//! - [`ActorContext`] - Explicit self / parent / sender for each delivery
//! - [`FrameworkError`] - Runtime errors
//!
//! # Testing
//!
//! See [`mock`] for mock actors that expose their mailbox to the test.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
