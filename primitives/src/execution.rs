//! Receipts: the recorded, immutable outcome of handling one action.

use crate::types::Hash;

/// Outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReceiptStatus {
    /// The action was applied in full.
    Success = 1,
    /// Gas and sequence were charged, but no value moved.
    Failure = 0,
}

impl ReceiptStatus {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert from a u8 value.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Failure),
            1 => Some(Self::Success),
            _ => None,
        }
    }
}

impl core::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Per-action receipt.
///
/// A `Failure` receipt is a valid committed outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub gas_consumed: u64,
    pub action_hash: Hash,
}

impl Receipt {
    pub fn success(gas_consumed: u64, action_hash: Hash) -> Self {
        Self {
            status: ReceiptStatus::Success,
            gas_consumed,
            action_hash,
        }
    }

    pub fn failure(gas_consumed: u64, action_hash: Hash) -> Self {
        Self {
            status: ReceiptStatus::Failure,
            gas_consumed,
            action_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_status_from_u8() {
        assert_eq!(ReceiptStatus::from_u8(0), Some(ReceiptStatus::Failure));
        assert_eq!(ReceiptStatus::from_u8(1), Some(ReceiptStatus::Success));
        assert_eq!(ReceiptStatus::from_u8(2), None);
    }

    #[test]
    fn test_receipt_constructors() {
        let ok = Receipt::success(500, [1u8; 32]);
        assert!(ok.status.is_success());
        assert_eq!(ok.gas_consumed, 500);

        let failed = Receipt::failure(500, [1u8; 32]);
        assert!(!failed.status.is_success());
        assert_eq!(failed.status.to_string(), "FAILURE");
    }
}
