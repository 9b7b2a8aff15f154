//! Transfer protocol: moves value between accounts and charges gas.
//!
//! Validation is stateless and may run for many actions at once. Handling
//! runs once per action, in batch order, against the batch's working set:
//!
//! 1. Load the originator and check its sequence number.
//! 2. Compute intrinsic gas; abort with `OutOfGas` if it exceeds the limit.
//! 3. Debit `amount + fee`, or only the fee (capped at the balance) if the
//!    originator cannot cover both or delivery into a contract is refused.
//! 4. Advance the originator's sequence number.
//! 5. Credit the recipient on success.
//! 6. Hand the collected fee to the rewarding fee sink.
//! 7. Stage the touched accounts and return the receipt.
//!
//! Nothing is staged until every fallible read has succeeded, so an abort
//! leaves the working set as it was.

use std::str::FromStr;

use ledger_primitives::{
    Action, Address, BigUint, ExecError, ExecResult, Receipt, Transfer, ValidationError,
};
use num_bigint::Sign;
use tracing::debug;

use crate::account;
use crate::config::ProtocolConfig;
use crate::context::RunActionsCtx;
use crate::registry::Protocol;
use crate::rewarding;
use crate::working_set::WorkingSet;

/// Registry identifier of the transfer protocol.
pub const PROTOCOL_ID: &str = "transfer";

#[derive(Debug, Clone, Default)]
pub struct TransferProtocol {
    config: ProtocolConfig,
}

impl TransferProtocol {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Intrinsic gas for `transfer`, preferring the value metered upstream.
    pub fn intrinsic_gas(&self, ctx: &RunActionsCtx<'_>, transfer: &Transfer) -> u64 {
        ctx.intrinsic_gas
            .unwrap_or_else(|| self.config.intrinsic_gas.intrinsic_gas(transfer.payload.len()))
    }

    fn validate_transfer(&self, transfer: &Transfer, action: &Action) -> Result<(), ValidationError> {
        if transfer.payload.len() > self.config.max_payload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: transfer.payload.len(),
                max: self.config.max_payload_bytes,
            });
        }
        if transfer.amount.sign() == Sign::Minus {
            return Err(ValidationError::NegativeAmount(transfer.amount.clone()));
        }
        if action.gas_price().sign() == Sign::Minus {
            return Err(ValidationError::NegativeGasPrice(action.gas_price().clone()));
        }
        if let Err(e) = Address::from_str(&transfer.recipient) {
            return Err(ValidationError::MalformedRecipient {
                address: transfer.recipient.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

impl Protocol for TransferProtocol {
    fn id(&self) -> &str {
        PROTOCOL_ID
    }

    fn validate(&self, action: &Action) -> Result<(), ValidationError> {
        match action.as_transfer() {
            Some(transfer) => self.validate_transfer(transfer, action),
            None => Ok(()),
        }
    }

    fn handle(
        &self,
        ctx: &RunActionsCtx<'_>,
        action: &Action,
        ws: &mut WorkingSet,
    ) -> ExecResult<Option<Receipt>> {
        let Some(transfer) = action.as_transfer() else {
            return Ok(None);
        };

        // Handling only sees validated actions; these guard against callers
        // that skipped validation.
        let amount = transfer
            .amount
            .to_biguint()
            .ok_or_else(|| ExecError::InvalidAction("negative amount".into()))?;
        let gas_price = action
            .gas_price()
            .to_biguint()
            .ok_or_else(|| ExecError::InvalidAction("negative gas price".into()))?;
        let recipient = Address::from_str(&transfer.recipient)
            .map_err(|e| ExecError::InvalidAction(format!("recipient: {e}")))?;

        let caller = ctx.caller;
        let mut sender = account::load(ws, &caller)?;
        sender.check_sequence(action.sequence_number())?;

        let intrinsic = self.intrinsic_gas(ctx, transfer);
        if intrinsic > action.gas_limit() {
            return Err(ExecError::OutOfGas {
                limit: action.gas_limit(),
                required: intrinsic,
            });
        }
        let fee = BigUint::from(intrinsic) * &gas_price;

        let self_transfer = recipient == caller;
        let mut receiver = if self_transfer {
            None
        } else {
            Some(account::load(ws, &recipient)?)
        };
        let to_contract = receiver.as_ref().unwrap_or(&sender).is_contract();
        let blocked = to_contract && self.config.contract_delivery.blocks(&transfer.payload);

        let total = &amount + &fee;
        let (success, charged) = if !blocked && sender.balance >= total {
            sender.debit(&total)?;
            (true, fee)
        } else {
            let charged = if sender.balance < fee {
                sender.balance.clone()
            } else {
                fee
            };
            sender.debit(&charged)?;
            (false, charged)
        };
        sender.bump_sequence(action.sequence_number())?;

        if success {
            match receiver.as_mut() {
                Some(receiver) => receiver.credit(&amount),
                None => sender.credit(&amount),
            }
        }

        match ctx.registry.find(rewarding::PROTOCOL_ID) {
            Ok(protocol) => match protocol.fee_sink() {
                Some(sink) => sink.deposit_fee(ctx, ws, &charged)?,
                None => debug!(fee = %charged, "rewarding protocol has no fee sink"),
            },
            Err(ExecError::ProtocolNotFound(_)) => {
                debug!(fee = %charged, "no rewarding protocol registered, fee not deposited")
            }
            Err(e) => return Err(e),
        }

        account::store(ws, &caller, &sender)?;
        if success {
            if let Some(receiver) = &receiver {
                account::store(ws, &recipient, receiver)?;
            }
        }

        debug!(
            height = ctx.block_height,
            from = %caller,
            to = %recipient,
            amount = %amount,
            fee = %charged,
            gas = intrinsic,
            success,
            blocked,
            "transfer handled"
        );

        let action_hash = action.hash();
        Ok(Some(if success {
            Receipt::success(intrinsic, action_hash)
        } else {
            Receipt::failure(intrinsic, action_hash)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BlockContext;
    use crate::registry::Registry;
    use crate::rewarding::RewardingProtocol;
    use crate::store::MemStore;
    use ledger_primitives::{Account, BigInt, ReceiptStatus};
    use std::sync::Arc;

    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn alice() -> Address {
        Address::new([0x11; 20])
    }

    fn bob() -> Address {
        BOB.parse().unwrap()
    }

    fn transfer(seq: u64, amount: i64, recipient: &str, payload: Vec<u8>, price: i64) -> Action {
        Action::transfer(
            seq,
            BigInt::from(amount),
            recipient,
            payload,
            100_000,
            BigInt::from(price),
        )
    }

    fn block() -> BlockContext {
        BlockContext {
            block_height: 1,
            producer: Address::new([0xee; 20]),
            gas_limit: 10_000_000,
        }
    }

    fn funded(balance: u64) -> (Arc<MemStore>, WorkingSet) {
        let store = Arc::new(MemStore::with_accounts([(
            alice(),
            Account::with_balance(BigUint::from(balance)),
        )]));
        let ws = WorkingSet::new(store.clone()).unwrap();
        (store, ws)
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_protocol(Arc::new(TransferProtocol::default()))
            .unwrap();
        registry
            .register_protocol(Arc::new(RewardingProtocol::new()))
            .unwrap();
        registry
    }

    // ── Validate ──

    #[test]
    fn test_validate_accepts_well_formed() {
        let protocol = TransferProtocol::default();
        assert!(protocol.validate(&transfer(1, 5, BOB, vec![1, 2], 1)).is_ok());
    }

    #[test]
    fn test_validate_payload_too_large() {
        let protocol = TransferProtocol::default();
        let action = transfer(1, 5, BOB, vec![0; 32 * 1024 + 1], 1);
        assert_eq!(
            protocol.validate(&action),
            Err(ValidationError::PayloadTooLarge {
                size: 32_769,
                max: 32_768,
            })
        );
        // exactly at the limit is fine
        assert!(protocol.validate(&transfer(1, 5, BOB, vec![0; 32 * 1024], 1)).is_ok());
    }

    #[test]
    fn test_validate_negative_amount() {
        let protocol = TransferProtocol::default();
        let err = protocol.validate(&transfer(1, -100, BOB, vec![], 1)).unwrap_err();
        assert_eq!(err, ValidationError::NegativeAmount(BigInt::from(-100)));
    }

    #[test]
    fn test_validate_malformed_recipient() {
        let protocol = TransferProtocol::default();
        let recipient = format!("{BOB}aaa");
        let err = protocol.validate(&transfer(1, 5, &recipient, vec![], 1)).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedRecipient { .. }));
        assert!(err.to_string().contains("recipient"));
    }

    #[test]
    fn test_validate_negative_gas_price() {
        let protocol = TransferProtocol::default();
        let err = protocol.validate(&transfer(1, 5, BOB, vec![], -1)).unwrap_err();
        assert_eq!(err, ValidationError::NegativeGasPrice(BigInt::from(-1)));
    }

    #[test]
    fn test_validate_gas_price_checked_before_recipient() {
        let protocol = TransferProtocol::default();
        let action = Action::transfer(1, BigInt::from(100), "2", vec![], 100_000, BigInt::from(-1));
        assert_eq!(
            protocol.validate(&action),
            Err(ValidationError::NegativeGasPrice(BigInt::from(-1)))
        );

        // same recipient, valid price: now the address is what fails
        let action = Action::transfer(1, BigInt::from(100), "2", vec![], 100_000, BigInt::from(1));
        assert!(matches!(
            protocol.validate(&action),
            Err(ValidationError::MalformedRecipient { .. })
        ));
    }

    #[test]
    fn test_validate_reports_first_failure() {
        let protocol = TransferProtocol::default();
        let action = transfer(1, -1, "junk", vec![0; 40_000], -1);
        assert!(matches!(
            protocol.validate(&action),
            Err(ValidationError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_respects_configured_limit() {
        let protocol = TransferProtocol::new(ProtocolConfig {
            max_payload_bytes: 4,
            ..ProtocolConfig::default()
        });
        assert!(protocol.validate(&transfer(1, 0, BOB, vec![0; 5], 0)).is_err());
    }

    // ── Handle ──

    #[test]
    fn test_handle_success_moves_value_and_fee() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);
        let protocol = TransferProtocol::default();

        let receipt = protocol
            .handle(&ctx, &transfer(1, 2, BOB, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();

        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(receipt.gas_consumed, 10_000);
        let sender = account::load(&mut ws, &alice()).unwrap();
        assert_eq!(sender.balance, BigUint::from(40_003u32));
        assert_eq!(sender.sequence_number, 1);
        assert_eq!(account::load(&mut ws, &bob()).unwrap().balance, BigUint::from(2u32));
        let fund = RewardingProtocol::new().fund(&mut ws).unwrap();
        assert_eq!(fund.total_balance, BigUint::from(10_000u32));
    }

    #[test]
    fn test_handle_payload_bytes_cost_gas() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 0, BOB, vec![7; 3], 1), &mut ws)
            .unwrap()
            .unwrap();
        assert_eq!(receipt.gas_consumed, 10_300);
    }

    #[test]
    fn test_handle_sequence_mismatch_leaves_state() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);

        let err = TransferProtocol::default()
            .handle(&ctx, &transfer(2, 1, BOB, vec![], 1), &mut ws)
            .unwrap_err();
        assert_eq!(err, ExecError::SequenceMismatch { expected: 1, got: 2 });
        assert!(!err.is_fatal());
        assert_eq!(ws.dirty_len(), 0);
    }

    #[test]
    fn test_handle_out_of_gas_before_mutation() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);
        let action = Action::transfer(1, BigInt::from(1), BOB, vec![], 9_999, BigInt::from(1));

        let err = TransferProtocol::default().handle(&ctx, &action, &mut ws).unwrap_err();
        assert_eq!(
            err,
            ExecError::OutOfGas {
                limit: 9_999,
                required: 10_000,
            }
        );
        assert_eq!(ws.dirty_len(), 0);
    }

    #[test]
    fn test_handle_trusts_context_intrinsic_gas() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), Some(500), &registry);
        let (_store, mut ws) = funded(1_000);

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 100, BOB, vec![1; 10], 1), &mut ws)
            .unwrap()
            .unwrap();
        assert_eq!(receipt.gas_consumed, 500);
        assert_eq!(
            account::load(&mut ws, &alice()).unwrap().balance,
            BigUint::from(400u32)
        );
    }

    #[test]
    fn test_handle_shortfall_charges_gas_only() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(10_500);

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 1_000, BOB, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();

        assert_eq!(receipt.status, ReceiptStatus::Failure);
        let sender = account::load(&mut ws, &alice()).unwrap();
        assert_eq!(sender.balance, BigUint::from(500u32));
        assert_eq!(sender.sequence_number, 1);
        assert!(account::load(&mut ws, &bob()).unwrap().is_empty());
    }

    #[test]
    fn test_handle_fee_capped_at_balance() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(300);

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 1, BOB, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();

        assert!(!receipt.status.is_success());
        let sender = account::load(&mut ws, &alice()).unwrap();
        assert_eq!(sender.balance, BigUint::default());
        assert_eq!(sender.sequence_number, 1);
        let fund = RewardingProtocol::new().fund(&mut ws).unwrap();
        assert_eq!(fund.total_balance, BigUint::from(300u32));
    }

    #[test]
    fn test_handle_self_transfer_costs_only_fee() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(20_000);
        let me = alice().to_string();

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 5_000, &me, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();

        assert!(receipt.status.is_success());
        let sender = account::load(&mut ws, &alice()).unwrap();
        assert_eq!(sender.balance, BigUint::from(10_000u32));
        assert_eq!(sender.sequence_number, 1);
    }

    #[test]
    fn test_handle_plain_value_into_contract() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let store = Arc::new(MemStore::with_accounts([
            (alice(), Account::with_balance(BigUint::from(50_000u32))),
            (bob(), Account::contract(vec![0xc0; 32])),
        ]));
        let mut ws = WorkingSet::new(store).unwrap();

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 7, BOB, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();
        assert!(receipt.status.is_success());
        assert_eq!(account::load(&mut ws, &bob()).unwrap().balance, BigUint::from(7u32));
    }

    #[test]
    fn test_handle_without_fee_sink() {
        let mut registry = Registry::new();
        registry
            .register_protocol(Arc::new(TransferProtocol::default()))
            .unwrap();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);

        let receipt = TransferProtocol::default()
            .handle(&ctx, &transfer(1, 2, BOB, vec![], 1), &mut ws)
            .unwrap()
            .unwrap();
        assert!(receipt.status.is_success());
        assert!(ws.try_state(&rewarding::fund_key()).unwrap().is_none());
    }

    #[test]
    fn test_handle_rejects_unvalidated_amount() {
        let registry = registry();
        let ctx = block().run_ctx(alice(), None, &registry);
        let (_store, mut ws) = funded(50_005);

        let err = TransferProtocol::default()
            .handle(&ctx, &transfer(1, -1, BOB, vec![], 1), &mut ws)
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidAction(_)));
        assert_eq!(ws.dirty_len(), 0);
    }
}
