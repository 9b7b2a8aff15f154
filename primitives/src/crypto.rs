//! Hashing used for state commitments, action hashes and derived state keys.
//!
//! Signature verification happens before actions reach this core, so only
//! digests live here.

use crate::types::{Hash, Hash160};

/// Compute BLAKE3 hash of the input data.
pub fn hash_blake3(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive a 160-bit state key from arbitrary bytes.
///
/// Used for protocol-owned records that do not live under an account address.
pub fn hash160(data: &[u8]) -> Hash160 {
    let full = hash_blake3(data);
    let mut key = [0u8; 20];
    key.copy_from_slice(&full[..20]);
    key
}
