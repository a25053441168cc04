//! # Domain Errors
//!
//! Error types for the token relay and its ledger collaborator.
//!
//! Every error is raised before any table is touched, so a failed call
//! leaves the relay exactly as it was.

use icp_01_light_client::LightClientError;
use shared_types::{Name, TypeError};
use thiserror::Error;

/// Token ledger error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No wrapped token with this symbol was created for the contract.
    #[error("Token {symbol} of {contract} does not exist")]
    TokenNotFound {
        /// Origin token contract
        contract: Name,
        /// Symbol code
        symbol: String,
    },

    /// A wrapped token with this symbol already exists.
    #[error("Token {symbol} of {contract} already exists")]
    TokenExists {
        /// Origin token contract
        contract: Name,
        /// Symbol code
        symbol: String,
    },

    /// Quantity is malformed or not positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Quantity precision differs from the token's.
    #[error("Symbol precision mismatch")]
    SymbolMismatch,

    /// Account has no balance row for the symbol.
    #[error("No balance object found for {account}")]
    NoBalance {
        /// Account holding no balance
        account: Name,
    },

    /// Balance too small.
    #[error("Overdrawn balance for {account}")]
    Overdrawn {
        /// Account short of funds
        account: Name,
    },

    /// Mint would overflow the supply.
    #[error("Quantity exceeds available supply")]
    SupplyOverflow,

    /// Burn exceeds the outstanding supply.
    #[error("Quantity exceeds outstanding supply")]
    SupplyExceeded,

    /// Sender and recipient are the same account.
    #[error("Cannot transfer to self")]
    SelfTransfer,

    /// Memo longer than the ledger accepts.
    #[error("Memo has more than {0} bytes")]
    MemoTooLong(usize),

    /// Value type error.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Token relay error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Caller lacks the permission the operation requires.
    #[error("Unauthorized: {caller} is not {required}")]
    Unauthorized {
        /// Account that attempted the call
        caller: Name,
        /// Account whose authority is required
        required: Name,
    },

    /// Peer contracts may only be set once.
    #[error("Peer contracts already set")]
    ContractsAlreadySet,

    /// Relay used before peer contracts were configured.
    #[error("Peer contracts not set")]
    ContractsNotSet,

    /// Quantity is malformed or not positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Memo exceeds the configured bound.
    #[error("Memo has {len} bytes, more than {max}")]
    MemoTooLong {
        /// Memo length in bytes
        len: usize,
        /// Maximum accepted
        max: usize,
    },

    /// A relay memo could not be parsed.
    #[error("Invalid relay memo: {0}")]
    InvalidMemo(String),

    /// No staged deposit for the account and symbol.
    #[error("No deposit object found for {account} ({symbol})")]
    NoDeposit {
        /// Depositor
        account: Name,
        /// Requested symbol
        symbol: String,
    },

    /// Staged deposit smaller than the requested amount.
    #[error("Overdrawn deposit: {available} staged, {requested} requested")]
    OverdrawnDeposit {
        /// Staged amount
        available: i64,
        /// Requested amount
        requested: i64,
    },

    /// Inbound packet skips a sequence number.
    #[error("Out-of-order packet: expected {expected}, got {got}")]
    OutOfOrderPacket {
        /// Next sequence the channel accepts
        expected: u64,
        /// Sequence received
        got: u64,
    },

    /// Receipt cannot be applied.
    #[error("Malformed receipt: {0}")]
    MalformedReceipt(String),

    /// Proven action is not the channel event the call expects.
    #[error("Unexpected channel event: {0}")]
    UnexpectedEvent(String),

    /// Proven action was executed by the wrong account.
    #[error("Unexpected receiver: expected {expected}, got {got}")]
    UnexpectedReceiver {
        /// Peer channel account
        expected: Name,
        /// Receiver named in the action receipt
        got: Name,
    },

    /// `sha256(action)` differs from the receipt's action digest.
    #[error("Action digest mismatch")]
    ActionDigestMismatch,

    /// Action receipt digest differs from the proven leaf.
    #[error("Action receipt digest mismatch")]
    ReceiptDigestMismatch,

    /// Inclusion proof rejected by the light client.
    #[error("Proof rejected: {0}")]
    Proof(#[from] LightClientError),

    /// Ledger collaborator rejected a movement.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Outbox delivery failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<TypeError> for RelayError {
    fn from(e: TypeError) -> Self {
        RelayError::InvalidQuantity(e.to_string())
    }
}
