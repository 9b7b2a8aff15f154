//! Rewarding protocol: collects gas fees into a single fund record.
//!
//! Only the fee-sink side is implemented here. Distributing the fund to
//! block producers is driven by other actions that this core does not own.

use ledger_primitives::codec::{self, Reader};
use ledger_primitives::crypto::hash160;
use ledger_primitives::{Action, BigUint, ExecResult, Hash160, Receipt, ValidationError};
use num_traits::Zero;
use tracing::debug;

use crate::context::RunActionsCtx;
use crate::registry::{FeeSink, Protocol};
use crate::working_set::{StateValue, WorkingSet};

/// Registry identifier of the rewarding protocol.
pub const PROTOCOL_ID: &str = "rewarding";

/// State key of the fund record.
pub fn fund_key() -> Hash160 {
    hash160(b"rewarding/fund")
}

/// Accumulated fees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fund {
    pub total_balance: BigUint,
    /// Part of the total not yet paid out.
    pub unclaimed_balance: BigUint,
}

impl StateValue for Fund {
    fn encode_state(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_biguint(&mut buf, &self.total_balance);
        codec::write_biguint(&mut buf, &self.unclaimed_balance);
        buf
    }

    fn decode_state(bytes: &[u8]) -> ExecResult<Self> {
        let mut r = Reader::new(bytes);
        let total_balance = r.read_biguint()?;
        let unclaimed_balance = r.read_biguint()?;
        r.finish()?;
        Ok(Self {
            total_balance,
            unclaimed_balance,
        })
    }
}

#[derive(Debug, Default)]
pub struct RewardingProtocol;

impl RewardingProtocol {
    pub fn new() -> Self {
        Self
    }

    /// Current fund as seen through `ws`.
    pub fn fund(&self, ws: &mut WorkingSet) -> ExecResult<Fund> {
        Ok(ws.load::<Fund>(&fund_key())?.unwrap_or_default())
    }
}

impl Protocol for RewardingProtocol {
    fn id(&self) -> &str {
        PROTOCOL_ID
    }

    fn validate(&self, _action: &Action) -> Result<(), ValidationError> {
        Ok(())
    }

    fn handle(
        &self,
        _ctx: &RunActionsCtx<'_>,
        _action: &Action,
        _ws: &mut WorkingSet,
    ) -> ExecResult<Option<Receipt>> {
        Ok(None)
    }

    fn fee_sink(&self) -> Option<&dyn FeeSink> {
        Some(self)
    }
}

impl FeeSink for RewardingProtocol {
    fn deposit_fee(
        &self,
        ctx: &RunActionsCtx<'_>,
        ws: &mut WorkingSet,
        amount: &BigUint,
    ) -> ExecResult<()> {
        // nothing to record
        if amount.is_zero() {
            return Ok(());
        }
        let mut fund = self.fund(ws)?;
        fund.total_balance += amount;
        fund.unclaimed_balance += amount;
        ws.put(fund_key(), &fund)?;
        debug!(
            height = ctx.block_height,
            caller = %ctx.caller,
            amount = %amount,
            total = %fund.total_balance,
            "fee deposited"
        );
        Ok(())
    }
}
