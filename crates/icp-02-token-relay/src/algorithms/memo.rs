//! # Transfer Memo Parsing
//!
//! A transfer into the relay account either relays immediately
//! (`"icp <to> <expiration>"`) or stages a deposit (anything else).

use shared_types::Name;

use crate::domain::{RelayError, TransferIntent};

const RELAY_PREFIX: &str = "icp ";

/// Classify a memo attached to a transfer into the relay account.
pub fn parse_transfer_memo(memo: &str) -> Result<TransferIntent, RelayError> {
    let Some(rest) = memo.strip_prefix(RELAY_PREFIX) else {
        return Ok(TransferIntent::Deposit);
    };
    let (to, expiration) = rest
        .split_once(' ')
        .ok_or_else(|| RelayError::InvalidMemo("expected \"icp <to> <expiration>\"".into()))?;
    let to = Name::new(to).map_err(|e| RelayError::InvalidMemo(e.to_string()))?;
    let expiration = expiration
        .trim()
        .parse::<u32>()
        .map_err(|e| RelayError::InvalidMemo(format!("expiration: {e}")))?;
    Ok(TransferIntent::Relay { to, expiration })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_memo() {
        assert_eq!(
            parse_transfer_memo("icp bob 1700000000").unwrap(),
            TransferIntent::Relay {
                to: Name::new("bob").unwrap(),
                expiration: 1_700_000_000
            }
        );
    }

    #[test]
    fn test_other_memos_are_deposits() {
        assert_eq!(parse_transfer_memo("").unwrap(), TransferIntent::Deposit);
        assert_eq!(parse_transfer_memo("for later").unwrap(), TransferIntent::Deposit);
        assert_eq!(parse_transfer_memo("icpbob 5").unwrap(), TransferIntent::Deposit);
    }

    #[test]
    fn test_malformed_relay_memos() {
        assert!(parse_transfer_memo("icp bob").is_err());
        assert!(parse_transfer_memo("icp BOB 10").is_err());
        assert!(parse_transfer_memo("icp bob soon").is_err());
        assert!(parse_transfer_memo("icp bob -1").is_err());
    }
}
