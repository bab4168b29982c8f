//! Start-up, wiring and shutdown.
//!
//! - [`GatewaySystem`] builds the transport once, owns the dispatcher and tracks the actors
//!   it spawns so [`GatewaySystem::shutdown`] can wait for them.
//! - [`setup_tracing`] initializes logging for binaries.

pub mod gateway_system;
pub mod tracing;

pub use self::gateway_system::*;
pub use self::tracing::*;
