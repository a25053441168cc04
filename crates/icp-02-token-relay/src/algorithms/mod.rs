//! # Algorithms
//!
//! Pure relay logic: memo classification and proven-action binding.

pub mod memo;
pub mod proven;

pub use memo::parse_transfer_memo;
pub use proven::check_action_binding;
