//! # Domain Invariants
//!
//! Input rules checked before any relay table or ledger is touched.

use shared_types::{Asset, Name};

use super::errors::RelayError;
use super::value_objects::ReceiptStatus;

/// Invariant: relayed quantities are valid and strictly positive.
pub fn invariant_positive_quantity(quantity: &Asset) -> Result<(), RelayError> {
    if !quantity.is_valid() {
        return Err(RelayError::InvalidQuantity(format!("{quantity} is malformed")));
    }
    if quantity.amount <= 0 {
        return Err(RelayError::InvalidQuantity(format!("{quantity} is not positive")));
    }
    Ok(())
}

/// Invariant: memos fit the relay bound.
pub fn invariant_memo_len(memo: &str, max: usize) -> Result<(), RelayError> {
    if memo.len() > max {
        return Err(RelayError::MemoTooLong {
            len: memo.len(),
            max,
        });
    }
    Ok(())
}

/// Invariant: the caller holds the required authority.
pub fn invariant_authorized(caller: &Name, required: &Name) -> Result<(), RelayError> {
    if caller != required {
        return Err(RelayError::Unauthorized {
            caller: caller.clone(),
            required: required.clone(),
        });
    }
    Ok(())
}

/// Invariant: a receipt resolves its packet one way or the other.
pub fn invariant_resolving_status(status: ReceiptStatus) -> Result<(), RelayError> {
    if status == ReceiptStatus::Unknown {
        return Err(RelayError::MalformedReceipt("unknown status".into()));
    }
    Ok(())
}
