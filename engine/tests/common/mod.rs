//! Shared test helpers for integration tests.
//!
//! Provides deterministic addresses, action builders, registry and store
//! factories used across all integration test files.

#![allow(dead_code)]

use std::sync::Arc;

use ledger_engine::{
    BlockContext, MemStore, ProtocolConfig, Registry, RewardingProtocol, SealedAction,
    TransferProtocol,
};
use ledger_primitives::{crypto::hash160, Account, Action, Address, BigInt, BigUint};

// ── Deterministic Addresses ──

/// Address derived from a label, stable across machines.
pub fn named(label: &str) -> Address {
    Address::new(hash160(label.as_bytes()))
}

pub fn alice() -> Address {
    named("alice")
}

pub fn bob() -> Address {
    named("bob")
}

pub fn charlie() -> Address {
    named("charlie")
}

/// Block producer used by every test context.
pub fn producer() -> Address {
    named("producer")
}

// ── Contexts and Registries ──

pub fn block(height: u64) -> BlockContext {
    BlockContext {
        block_height: height,
        producer: producer(),
        gas_limit: 10_000_000,
    }
}

/// Transfer and rewarding protocols with the given transfer config.
pub fn registry_with(config: ProtocolConfig) -> Registry {
    let mut registry = Registry::new();
    registry
        .register_protocol(Arc::new(TransferProtocol::new(config)))
        .expect("register transfer");
    registry
        .register_protocol(Arc::new(RewardingProtocol::new()))
        .expect("register rewarding");
    registry
}

pub fn registry() -> Registry {
    registry_with(ProtocolConfig::default())
}

// ── State ──

pub fn eoa(balance: u64) -> Account {
    Account::with_balance(BigUint::from(balance))
}

pub fn contract() -> Account {
    Account::contract(vec![0xc0; 32])
}

pub fn store_with(accounts: Vec<(Address, Account)>) -> Arc<MemStore> {
    Arc::new(MemStore::with_accounts(accounts))
}

pub fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

// ── Actions ──

/// A transfer of `amount` from `from` to `to` with a 10 000 gas limit.
pub fn transfer(from: Address, seq: u64, to: Address, amount: u64, gas_price: u64) -> SealedAction {
    transfer_with_payload(from, seq, to, amount, gas_price, Vec::new())
}

pub fn transfer_with_payload(
    from: Address,
    seq: u64,
    to: Address,
    amount: u64,
    gas_price: u64,
    payload: Vec<u8>,
) -> SealedAction {
    SealedAction::new(
        from,
        Action::transfer(
            seq,
            BigInt::from(amount),
            to.to_string(),
            payload,
            10_000,
            BigInt::from(gas_price),
        ),
    )
}

/// Rewarding fund total at the store's head.
pub fn committed_fund(store: &Arc<MemStore>) -> BigUint {
    use ledger_engine::{rewarding::fund_key, Fund, StateStore, StateValue};

    let root = store.root().expect("root");
    match store.get(&root, &fund_key()).expect("fund lookup") {
        Some(bytes) => Fund::decode_state(&bytes).expect("fund decodes").total_balance,
        None => BigUint::default(),
    }
}

/// Sum of the committed balances of `addresses`.
pub fn committed_total(store: &Arc<MemStore>, addresses: &[Address]) -> BigUint {
    addresses
        .iter()
        .map(|a| {
            ledger_engine::account::load_committed(store.as_ref(), a)
                .expect("account")
                .balance
        })
        .sum()
}
