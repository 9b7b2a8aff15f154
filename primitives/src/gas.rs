//! Gas accounting: intrinsic gas policy and the block-level gas meter.
//!
//! Gas quantities are `u64` and never wrap: cost computations saturate and
//! the meter uses checked addition.

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

/// Base intrinsic gas charged for every transfer.
pub const TRANSFER_BASE_INTRINSIC_GAS: u64 = 10_000;

/// Intrinsic gas charged per payload byte.
pub const TRANSFER_PAYLOAD_GAS: u64 = 100;

/// Intrinsic gas formula: `base + per_byte * payload_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrinsicGasConfig {
    pub base: u64,
    pub per_byte: u64,
}

impl Default for IntrinsicGasConfig {
    fn default() -> Self {
        Self {
            base: TRANSFER_BASE_INTRINSIC_GAS,
            per_byte: TRANSFER_PAYLOAD_GAS,
        }
    }
}

impl IntrinsicGasConfig {
    /// Intrinsic gas for an action carrying `payload_len` bytes.
    pub fn intrinsic_gas(&self, payload_len: usize) -> u64 {
        self.base
            .saturating_add((payload_len as u64).saturating_mul(self.per_byte))
    }
}

/// Gas spent so far against a ceiling, such as the block gas limit.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Charge `amount`, or fail with `OutOfGas` and charge nothing.
    pub fn consume(&mut self, amount: u64) -> ExecResult<()> {
        let total = match self.consumed.checked_add(amount) {
            Some(total) if total <= self.limit => total,
            _ => {
                return Err(ExecError::OutOfGas {
                    limit: self.limit,
                    required: self.consumed.saturating_add(amount),
                });
            }
        };
        self.consumed = total;
        Ok(())
    }

    /// Check that `amount` could be consumed without consuming it.
    pub fn ensure_available(&self, amount: u64) -> ExecResult<()> {
        if amount > self.remaining() {
            return Err(ExecError::OutOfGas {
                limit: self.limit,
                required: self.consumed.saturating_add(amount),
            });
        }
        Ok(())
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.limit
    }
}
