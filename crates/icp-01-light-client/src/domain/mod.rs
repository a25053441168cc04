//! # Domain Module
//!
//! Core domain types for the light client.

pub mod entities;
pub mod errors;
pub mod incremental_merkle;
pub mod invariants;
pub mod tables;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use incremental_merkle::*;
pub use invariants::*;
pub use tables::*;
pub use value_objects::*;
