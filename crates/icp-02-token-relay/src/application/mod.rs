//! # Application Layer
//!
//! The packet channel, the lock manager and the service wiring them to the
//! light client.

pub mod channel;
pub mod relay;
pub mod service;

pub use channel::PacketChannel;
pub use relay::TokenRelay;
pub use service::RelayService;
