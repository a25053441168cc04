//! # Relay Node Library
//!
//! This library exposes the internal modules of the relay node for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Modules
//!
//! - `config` - `NodeConfig` loading (JSON file + `ICP_*` environment)
//! - `commands` - JSON command boundary
//! - `runtime` - Fork store + relay service, one handler per command
//! - `transport` - Outbox events as JSON lines

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod config;
pub mod runtime;
pub mod transport;

pub use commands::{parse_command, Command, Response};
pub use config::{load_config, NodeConfig};
pub use runtime::{NodeError, NodeRuntime};
pub use transport::JsonLinesTransport;
