//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the fork store.

mod ed25519_verifier;

pub use ed25519_verifier::Ed25519HeaderVerifier;
