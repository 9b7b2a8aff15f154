//! Core type aliases, the `Address` newtype and constants shared by the
//! primitives and the engine.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// 32-byte digest used for state roots and action hashes.
pub type Hash = [u8; 32];

/// 20-byte state key. Account keys are the raw address bytes.
pub type Hash160 = [u8; 20];

/// Block height (monotonically increasing).
pub type BlockHeight = u64;

/// Length of an address in bytes (160 bits).
pub const ADDRESS_LEN: usize = 20;

/// Maximum transfer payload size accepted by validation (32 KiB).
pub const MAX_PAYLOAD_BYTES: usize = 32 * 1024;

/// A zero-valued hash; the root of an empty state.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Identifier of a ledger participant.
///
/// The textual form is 40 hex characters with an optional `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

/// Reason an address string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("expected {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The state key under which this address's account is stored.
    pub fn state_key(&self) -> Hash160 {
        self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                got: digits.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Convert a `Hash` to a hex string for display purposes.
pub fn hash_to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}
