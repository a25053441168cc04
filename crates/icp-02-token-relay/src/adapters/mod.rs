//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the token relay.

mod fork_store_verifier;
mod in_memory_ledger;

pub use fork_store_verifier::ForkStoreVerifier;
pub use in_memory_ledger::InMemoryTokenLedger;
