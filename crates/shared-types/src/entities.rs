//! # Core Entities
//!
//! Digest, key and naming primitives used across the relay.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypeError;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// The all-zero digest, used for "no value" roots.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Longest account name accepted.
pub const MAX_NAME_LEN: usize = 12;

/// An on-chain account name (`a-z`, `1-5` and `.`, at most 12 chars).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Create a validated name.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        let well_formed = !value.is_empty()
            && value.len() <= MAX_NAME_LEN
            && !value.ends_with('.')
            && value
                .bytes()
                .all(|b| b.is_ascii_lowercase() || (b'1'..=b'5').contains(&b) || b == b'.');
        if !well_formed {
            return Err(TypeError::InvalidName(value));
        }
        Ok(Self(value))
    }

    /// Name from a compile-time literal known to be well formed.
    pub fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::new(value).is_ok(), "invalid static name {value}");
        Self(value.to_owned())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length-prefixed bytes used inside canonical digests.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() + 1);
        out.push(self.0.len() as u8);
        out.extend_from_slice(self.0.as_bytes());
        out
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl FromStr for Name {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Name {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

/// Block time expressed as a half-second slot number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockTimestamp(pub u32);

impl BlockTimestamp {
    /// Slot duration in milliseconds.
    pub const SLOT_MS: u64 = 500;

    /// Raw slot number.
    pub fn slot(self) -> u32 {
        self.0
    }

    /// The following slot.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}
