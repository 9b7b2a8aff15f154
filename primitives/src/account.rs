//! Account model: balance, sequence number and optional code hash.
//!
//! A never-touched address is represented by `Account::default()`; absence in
//! state is not an error. Mutations here act on an in-memory copy only and
//! become visible once the caller stages the account into a working set.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{ExecError, ExecResult};

/// Ledger participant state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub balance: BigUint,
    /// Sequence number of the last action originated by this account.
    pub sequence_number: u64,
    /// Non-empty for contract accounts.
    pub code_hash: Vec<u8>,
}

impl Account {
    /// An externally owned account holding `balance`.
    pub fn with_balance(balance: BigUint) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// A contract account with zero balance.
    pub fn contract(code_hash: Vec<u8>) -> Self {
        Self {
            code_hash,
            ..Self::default()
        }
    }

    pub fn is_contract(&self) -> bool {
        !self.code_hash.is_empty()
    }

    /// True for the canonical never-touched account.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.sequence_number == 0 && self.code_hash.is_empty()
    }

    pub fn credit(&mut self, amount: &BigUint) {
        self.balance += amount;
    }

    /// Subtract `amount` from the balance, or leave it untouched and fail
    /// with `InsufficientBalance`.
    pub fn debit(&mut self, amount: &BigUint) -> ExecResult<()> {
        if *amount > self.balance {
            return Err(ExecError::InsufficientBalance {
                balance: self.balance.clone(),
                required: amount.clone(),
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Advance the sequence number to `declared`, which must be exactly one
    /// past the current value.
    pub fn bump_sequence(&mut self, declared: u64) -> ExecResult<()> {
        self.check_sequence(declared)?;
        self.sequence_number = declared;
        Ok(())
    }

    /// Check `declared` without mutating.
    pub fn check_sequence(&self, declared: u64) -> ExecResult<()> {
        let expected = self.sequence_number.checked_add(1).ok_or_else(|| {
            ExecError::SequenceMismatch {
                expected: u64::MAX,
                got: declared,
            }
        })?;
        if declared != expected {
            return Err(ExecError::SequenceMismatch {
                expected,
                got: declared,
            });
        }
        Ok(())
    }
}
