//! Error types for the ledger core.
//!
//! Two channels are kept apart at the type level:
//!
//! - [`ValidationError`]: stateless rejection before an action is sequenced.
//!   Nothing is charged and nothing is written.
//! - [`ExecError`]: errors raised while handling or committing. Some abort a
//!   single action, others are fatal to the whole batch (see
//!   [`ExecError::is_fatal`]).
//!
//! Failure receipts are neither: they are committed outcomes.

use crate::types::{Hash, hash_to_hex};
use num_bigint::{BigInt, BigUint};

/// Structural rejection of an action by `Protocol::validate`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("negative transfer amount {0}")]
    NegativeAmount(BigInt),

    #[error("error when validating recipient's address {address}: {reason}")]
    MalformedRecipient { address: String, reason: String },

    #[error("negative gas price {0}")]
    NegativeGasPrice(BigInt),
}

/// Execution engine error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// Intrinsic gas exceeds the declared limit, or the block ceiling is reached.
    #[error("out of gas: limit={limit}, required={required}")]
    OutOfGas { limit: u64, required: u64 },

    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u64, got: u64 },

    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: BigUint, required: BigUint },

    #[error("no registered protocol handles the action")]
    Unhandled,

    /// The action reached handling with fields validation should have rejected.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("protocol {0} is already registered")]
    DuplicateProtocol(String),

    #[error("protocol {0} is not registered")]
    ProtocolNotFound(String),

    #[error("state not found for key 0x{}", hex::encode(.0))]
    StateNotFound([u8; 20]),

    #[error("state store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("commit conflict: base root {} but head is {}", hash_to_hex(.expected), hash_to_hex(.actual))]
    CommitConflict { expected: Hash, actual: Hash },

    #[error("corrupted state: {0}")]
    Corrupted(String),

    #[error("invalid run context: {0}")]
    InvalidContext(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ExecError {
    /// Returns true if the error must halt the whole batch rather than just
    /// the action that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_)
                | Self::CommitConflict { .. }
                | Self::Corrupted(_)
                | Self::InvalidContext(_)
                | Self::InvalidConfig(_)
        )
    }
}

/// Convenience result type for the execution layer.
pub type ExecResult<T> = core::result::Result<T, ExecError>;
