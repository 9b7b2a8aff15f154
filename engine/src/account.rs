//! Loading and staging accounts through a working set.

use ledger_primitives::{Account, Address, ExecResult};

use crate::store::StateStore;
use crate::working_set::{StateValue, WorkingSet};

/// Load the account at `address`, or the zero account if it was never touched.
pub fn load(ws: &mut WorkingSet, address: &Address) -> ExecResult<Account> {
    Ok(ws.load::<Account>(&address.state_key())?.unwrap_or_default())
}

/// Stage `account` under `address`.
pub fn store(ws: &mut WorkingSet, address: &Address, account: &Account) -> ExecResult<()> {
    ws.put(address.state_key(), account)
}

/// Read an account from the store's current head, bypassing any working set.
pub fn load_committed(store: &dyn StateStore, address: &Address) -> ExecResult<Account> {
    let root = store.root()?;
    match store.get(&root, &address.state_key())? {
        Some(bytes) => Account::decode_state(&bytes),
        None => Ok(Account::default()),
    }
}
