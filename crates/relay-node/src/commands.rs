//! # Commands
//!
//! The node's command boundary: one JSON object per line, tagged by `cmd`.

use icp_01_light_client::{BlockHeaderState, SignedBlockHeader};
use icp_02_token_relay::ProvenAction;
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Hash, Name, Symbol};

/// A request to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Install the trusted peer-chain seed.
    InitSeed {
        /// Store owner
        caller: Name,
        /// Seed state
        state: Box<BlockHeaderState>,
    },
    /// Link a peer-chain header.
    AddHeader {
        /// Signed header
        header: SignedBlockHeader,
    },
    /// Jump ahead with a full state bridged by an id path.
    AddHeaderWithMerklePath {
        /// Full state of the new block
        state: Box<BlockHeaderState>,
        /// Ids from a stored block up to the state's parent
        merkle_path: Vec<Hash>,
    },
    /// Reset or re-bound the fork store.
    Reset {
        /// Store owner
        caller: Name,
        /// Wipe every record
        clear_all: bool,
        /// New retained-record cap
        max_blocks: u32,
    },
    /// Head and LIB of the fork store.
    Status,
    /// Block on the best chain by number.
    BlockByNum {
        /// Block number
        block_num: u32,
    },
    /// Governance: fix the channel endpoints.
    SetPeerContracts {
        /// Relay account
        caller: Name,
        /// Local channel account
        icp: Name,
        /// Peer relay account
        peer: Name,
    },
    /// Native transfer, relayed or staged when sent to the relay account.
    Transfer {
        /// Authorizing account
        caller: Name,
        /// Token contract
        contract: Name,
        /// Sender
        from: Name,
        /// Recipient
        to: Name,
        /// Amount
        quantity: Asset,
        /// Memo
        #[serde(default)]
        memo: String,
    },
    /// Relay a staged deposit.
    RelayDeposit {
        /// Authorizing account
        caller: Name,
        /// Token contract
        contract: Name,
        /// Depositor
        from: Name,
        /// Recipient on the peer
        icp_to: Name,
        /// Amount
        quantity: Asset,
        /// Memo
        #[serde(default)]
        memo: String,
        /// Peer-time expiration
        expiration: u32,
    },
    /// Burn wrapped tokens and send them home.
    Refund {
        /// Authorizing account
        caller: Name,
        /// Peer origin contract
        contract: Name,
        /// Holder
        from: Name,
        /// Recipient on the peer
        icp_to: Name,
        /// Amount
        quantity: Asset,
        /// Memo
        #[serde(default)]
        memo: String,
        /// Peer-time expiration
        expiration: u32,
    },
    /// Apply a proven peer packet.
    DeliverPacket {
        /// Packet action and its proof
        proven: Box<ProvenAction>,
        /// Peer-observed time in seconds
        now: u32,
    },
    /// Apply a proven peer receipt.
    DeliverReceipt {
        /// Receipt action and its proof
        proven: Box<ProvenAction>,
    },
    /// Prune resolved packets and receipts.
    Cleanup {
        /// Sequences to prune
        seqs: Vec<u64>,
    },
    /// Native and wrapped balance of an account.
    Balance {
        /// Token contract
        contract: Name,
        /// Holder
        account: Name,
        /// Symbol
        symbol: Symbol,
    },
}

/// One JSON result line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Did the command apply?
    pub ok: bool,
    /// Command-specific result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// A successful result.
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// A rejection.
    pub fn error(reason: impl ToString) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(reason.to_string()),
        }
    }
}

/// Decode one input line.
pub fn parse_command(line: &str) -> Result<Command, serde_json::Error> {
    serde_json::from_str(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transfer() {
        let cmd = parse_command(
            r#"{"cmd": "transfer", "caller": "alice", "contract": "eosio.token",
                "from": "alice", "to": "icp.token", "quantity": "1.0000 EOS",
                "memo": "icp bob 100"}"#,
        )
        .unwrap();
        match cmd {
            Command::Transfer { quantity, memo, .. } => {
                assert_eq!(quantity.amount, 10_000);
                assert_eq!(memo, "icp bob 100");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_unit_and_defaults() {
        assert_eq!(parse_command(r#"{"cmd": "status"}"#).unwrap(), Command::Status);
        let cmd = parse_command(
            r#"{"cmd": "relay_deposit", "caller": "alice", "contract": "eosio.token",
                "from": "alice", "icp_to": "bob", "quantity": "1.0000 EOS", "expiration": 5}"#,
        )
        .unwrap();
        assert!(matches!(cmd, Command::RelayDeposit { ref memo, .. } if memo.is_empty()));
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(parse_command(r#"{"cmd": "mint"}"#).is_err());
        assert!(parse_command(r#"{"cmd": "cleanup", "seqs": "all"}"#).is_err());
        assert!(parse_command("not json").is_err());
    }

    #[test]
    fn test_response_shape() {
        let line = serde_json::to_string(&Response::error("nope")).unwrap();
        assert_eq!(line, r#"{"ok":false,"error":"nope"}"#);
    }
}
