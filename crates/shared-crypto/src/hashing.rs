//! # SHA-256 Hashing
//!
//! One-shot helpers plus a streaming writer used to build canonical
//! encodings field by field.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

/// Hash the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut writer = DigestWriter::new();
    for input in inputs {
        writer.bytes(input);
    }
    writer.finish()
}

/// Streaming SHA-256 over a canonical little-endian field encoding.
#[derive(Clone, Default)]
pub struct DigestWriter {
    inner: Sha256,
}

impl DigestWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes, no length prefix.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Variable-length bytes with a u32 length prefix.
    pub fn var_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.u32(data.len() as u32);
        self.inner.update(data);
        self
    }

    /// Little-endian u16.
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Little-endian u32.
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Little-endian u64.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Little-endian i64.
    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Single byte flag.
    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.inner.update([u8::from(value)]);
        self
    }

    /// Finalize and return the digest.
    pub fn finish(&self) -> Hash {
        let mut output = [0u8; 32];
        output.copy_from_slice(&self.inner.clone().finalize());
        output
    }
}
