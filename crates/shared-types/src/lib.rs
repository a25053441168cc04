//! # Shared Types Crate
//!
//! Value types shared by every inter-chain subsystem.
//!
//! ## Design Principles
//!
//! - **Validated on construction**: a `Name`, `Symbol` or `Asset` that exists
//!   is well-formed. Decoding goes through the same constructors.
//! - **Single Source of Truth**: digests, keys and signatures are plain byte
//!   arrays defined once here.

pub mod asset;
pub mod entities;
pub mod errors;

pub use asset::{Asset, Symbol, MAX_AMOUNT, MAX_PRECISION};
pub use entities::*;
pub use errors::TypeError;
