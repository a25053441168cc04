//! # Error Types
//!
//! Validation errors raised while constructing shared value types.

use thiserror::Error;

/// Errors raised by shared value constructors and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Account name is empty, too long or uses characters outside `a-z1-5.`.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Symbol code or precision is out of range.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Asset text could not be parsed.
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Arithmetic on two assets of different symbols.
    #[error("Symbol mismatch: {left} vs {right}")]
    SymbolMismatch {
        /// Left-hand symbol
        left: String,
        /// Right-hand symbol
        right: String,
    },

    /// Result left the representable asset range.
    #[error("Asset amount out of range")]
    AmountOutOfRange,
}
