//! Batch executor: drives one batch of actions through the registry.
//!
//! `BlockExecutor::execute_batch` implements the execution lifecycle:
//!
//! 1. Validate the block context
//! 2. Validate every action (in parallel, results kept in input order)
//! 3. For each valid action, in order:
//!    a. Check the block gas ceiling against the declared gas limit
//!    b. Dispatch to the first protocol that handles it
//!    c. Record the receipt, or the action-level abort
//! 4. Return the outcomes; committing is a separate step
//!
//! **Atomicity:** a fatal error (store outage, corrupted state, commit
//! conflict) stops the batch and is returned as `Err`. Nothing has reached
//! the store at that point; the caller drops the working set. Action-level
//! aborts and failure receipts do NOT stop the batch.

use std::sync::Arc;

use ledger_primitives::{ExecError, ExecResult, GasMeter, Hash, Receipt, ValidationError};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::context::{validate_context, BlockContext, SealedAction};
use crate::registry::Registry;
use crate::store::StateStore;
use crate::working_set::WorkingSet;

/// What happened to one action of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Handled; the receipt may still record a failure.
    Applied(Receipt),
    /// Refused by validation. Nothing charged, nothing written.
    Rejected(ValidationError),
    /// Aborted during handling before any mutation.
    Aborted(ExecError),
}

impl ActionOutcome {
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Applied(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Result of executing a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub outcomes: Vec<ActionOutcome>,
    /// Sum of `gas_consumed` over all receipts.
    pub gas_used: u64,
}

impl BatchOutcome {
    /// Receipts of handled actions.
    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.outcomes.iter().filter_map(ActionOutcome::receipt)
    }
}

/// Stateless driver; all state goes through the working set it is given.
pub struct BlockExecutor;

impl BlockExecutor {
    /// Execute `actions` against `ws` without committing.
    #[tracing::instrument(skip_all, fields(height = ctx.block_height, actions = actions.len()))]
    pub fn execute_batch(
        ctx: &BlockContext,
        registry: &Registry,
        actions: &[SealedAction],
        ws: &mut WorkingSet,
    ) -> ExecResult<BatchOutcome> {
        validate_context(ctx)?;

        let validations = validate_all(registry, actions);
        let mut meter = GasMeter::new(ctx.gas_limit);
        let mut outcomes = Vec::with_capacity(actions.len());

        for (idx, (sealed, validation)) in actions.iter().zip(validations).enumerate() {
            if let Err(err) = validation {
                debug!(idx, %err, "action rejected");
                outcomes.push(ActionOutcome::Rejected(err));
                continue;
            }

            if let Err(err) = meter.ensure_available(sealed.action.gas_limit()) {
                debug!(idx, %err, "block gas ceiling reached");
                outcomes.push(ActionOutcome::Aborted(err));
                continue;
            }

            let run_ctx = ctx.run_ctx(sealed.caller, sealed.intrinsic_gas, registry);
            match registry.handle(&run_ctx, &sealed.action, ws) {
                Ok(receipt) => {
                    // Writes are already staged, so an overrun cannot be
                    // undone per action.
                    let limit = sealed.action.gas_limit();
                    if receipt.gas_consumed > limit {
                        error!(idx, limit, consumed = receipt.gas_consumed, "receipt overran gas limit");
                        return Err(ExecError::Corrupted(format!(
                            "receipt consumed {} gas over a limit of {}",
                            receipt.gas_consumed, limit
                        )));
                    }
                    meter.consume(receipt.gas_consumed)?;
                    outcomes.push(ActionOutcome::Applied(receipt));
                }
                Err(err) if err.is_fatal() => {
                    error!(idx, %err, "fatal error, batch abandoned");
                    return Err(err);
                }
                Err(err) => {
                    debug!(idx, %err, "action aborted");
                    outcomes.push(ActionOutcome::Aborted(err));
                }
            }
        }

        Ok(BatchOutcome {
            outcomes,
            gas_used: meter.consumed(),
        })
    }

    /// Execute `actions` on a fresh working set over the store's head and
    /// commit the result.
    ///
    /// Returns the new root. On any error the working set is discarded and
    /// the store keeps its previous head.
    pub fn execute_and_commit(
        ctx: &BlockContext,
        registry: &Registry,
        actions: &[SealedAction],
        store: Arc<dyn StateStore>,
    ) -> ExecResult<(Hash, BatchOutcome)> {
        let mut ws = WorkingSet::new(store)?;
        let outcome = match Self::execute_batch(ctx, registry, actions, &mut ws) {
            Ok(outcome) => outcome,
            Err(err) => {
                ws.discard();
                return Err(err);
            }
        };
        let root = ws.commit()?;
        Ok((root, outcome))
    }
}

/// Run stateless validation for every action on the rayon pool.
fn validate_all(registry: &Registry, actions: &[SealedAction]) -> Vec<Result<(), ValidationError>> {
    actions
        .par_iter()
        .map(|a| registry.validate(&a.action))
        .collect()
}
