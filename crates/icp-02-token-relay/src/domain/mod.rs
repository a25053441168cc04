//! # Domain Module
//!
//! Core domain types for the token relay.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod tables;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use tables::*;
pub use value_objects::*;
