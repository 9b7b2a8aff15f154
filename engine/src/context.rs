//! Execution context supplied by the block-execution driver.
//!
//! `BlockContext` carries what is fixed for a whole batch; `RunActionsCtx`
//! is the per-action view handed to `Protocol::handle`, with the caller
//! filled in and the registry borrowed from the driver.

use ledger_primitives::{Action, Address, BlockHeight, ExecError, ExecResult};

use crate::registry::Registry;

/// Batch-wide context (one block).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub block_height: BlockHeight,
    /// Address of the block producer.
    pub producer: Address,
    /// Gas ceiling for the whole batch.
    pub gas_limit: u64,
}

impl BlockContext {
    /// Per-action context for an action originated by `caller`.
    pub fn run_ctx<'a>(
        &self,
        caller: Address,
        intrinsic_gas: Option<u64>,
        registry: &'a Registry,
    ) -> RunActionsCtx<'a> {
        RunActionsCtx {
            block_height: self.block_height,
            producer: self.producer,
            caller,
            gas_limit: self.gas_limit,
            intrinsic_gas,
            registry,
        }
    }
}

/// Context for handling one action.
#[derive(Clone, Copy)]
pub struct RunActionsCtx<'a> {
    pub block_height: BlockHeight,
    pub producer: Address,
    /// Originator of the action; its signature was checked upstream.
    pub caller: Address,
    pub gas_limit: u64,
    /// Intrinsic gas already metered upstream. Trusted over the protocol's
    /// own formula when present.
    pub intrinsic_gas: Option<u64>,
    pub registry: &'a Registry,
}

/// An action together with its verified originator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedAction {
    pub caller: Address,
    pub action: Action,
    /// Precomputed intrinsic gas, if the admission layer metered it.
    pub intrinsic_gas: Option<u64>,
}

impl SealedAction {
    pub fn new(caller: Address, action: Action) -> Self {
        Self {
            caller,
            action,
            intrinsic_gas: None,
        }
    }

    pub fn with_intrinsic_gas(mut self, gas: u64) -> Self {
        self.intrinsic_gas = Some(gas);
        self
    }
}

/// Validate block-level fields before any action is processed.
///
/// Checks:
/// - `block_height > 0` (genesis is height 0, execution starts at 1)
/// - `gas_limit > 0`
pub fn validate_context(ctx: &BlockContext) -> ExecResult<()> {
    if ctx.block_height == 0 {
        return Err(ExecError::InvalidContext("block_height must be > 0".into()));
    }

    if ctx.gas_limit == 0 {
        return Err(ExecError::InvalidContext("gas_limit must be > 0".into()));
    }

    Ok(())
}
