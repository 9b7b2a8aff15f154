//! `ledger-primitives`: foundational types for the ledger state-transition core.
//!
//! This crate provides the account model, actions, receipts, error types,
//! gas policy, deterministic codec, state overlay and Merkle commitment shared
//! by the engine and its collaborators.

pub mod types;
pub mod error;
pub mod crypto;
pub mod codec;
pub mod account;
pub mod action;
pub mod execution;
pub mod gas;
pub mod state;
pub mod merkle;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, AddressError, BlockHeight, Hash, Hash160, MAX_PAYLOAD_BYTES, ZERO_HASH};
pub use error::{ExecError, ExecResult, ValidationError};
pub use account::Account;
pub use action::{Action, ActionBody, Transfer};
pub use execution::{Receipt, ReceiptStatus};
pub use gas::{GasMeter, IntrinsicGasConfig};
pub use state::{OverlayResult, StateOverlay, WriteBatch};
pub use merkle::StateTree;

pub use num_bigint::{BigInt, BigUint};
