//! Actions: immutable descriptions of intended state changes.
//!
//! Amount and gas price are signed so that a malformed submission can be
//! represented and then rejected by validation; handling only ever sees
//! values that passed validation.

use num_bigint::BigInt;

use crate::codec::encode_action;
use crate::crypto::hash_blake3;
use crate::types::Hash;

/// Body of a value transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub amount: BigInt,
    /// Textual recipient address, decoded during validation.
    pub recipient: String,
    pub payload: Vec<u8>,
}

/// Action kinds known to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionBody {
    Transfer(Transfer),
}

/// A sequenced, fee-bearing action.
///
/// Fields are private: an `Action` is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    sequence_number: u64,
    gas_limit: u64,
    gas_price: BigInt,
    body: ActionBody,
}

impl Action {
    pub fn new(sequence_number: u64, gas_limit: u64, gas_price: BigInt, body: ActionBody) -> Self {
        Self {
            sequence_number,
            gas_limit,
            gas_price,
            body,
        }
    }

    /// Build a transfer action.
    pub fn transfer(
        sequence_number: u64,
        amount: BigInt,
        recipient: impl Into<String>,
        payload: Vec<u8>,
        gas_limit: u64,
        gas_price: BigInt,
    ) -> Self {
        Self::new(
            sequence_number,
            gas_limit,
            gas_price,
            ActionBody::Transfer(Transfer {
                amount,
                recipient: recipient.into(),
                payload,
            }),
        )
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> &BigInt {
        &self.gas_price
    }

    pub fn body(&self) -> &ActionBody {
        &self.body
    }

    pub fn as_transfer(&self) -> Option<&Transfer> {
        match &self.body {
            ActionBody::Transfer(t) => Some(t),
        }
    }

    /// Length of the payload carried by the body.
    pub fn payload_len(&self) -> usize {
        match &self.body {
            ActionBody::Transfer(t) => t.payload.len(),
        }
    }

    /// BLAKE3 digest of the canonical encoding.
    pub fn hash(&self) -> Hash {
        hash_blake3(&encode_action(self))
    }
}
