//! Protocol registry and the capability every protocol exposes.
//!
//! The registry is built once per chain configuration and then only read.
//! It is passed by reference through [`RunActionsCtx`], so protocols can
//! reach each other (for example, to deposit collected fees) without any
//! process-wide state.

use std::collections::BTreeMap;
use std::sync::Arc;

use ledger_primitives::{Action, BigUint, ExecError, ExecResult, Receipt, ValidationError};

use crate::context::RunActionsCtx;
use crate::working_set::WorkingSet;

/// A pluggable handler for one action kind.
pub trait Protocol: Send + Sync {
    /// Stable identifier, used as the registry key.
    fn id(&self) -> &str;

    /// Stateless structural checks. Must not touch state; safe to run in
    /// parallel across many candidate actions. Protocols return `Ok(())`
    /// for action kinds they do not own.
    fn validate(&self, action: &Action) -> Result<(), ValidationError>;

    /// Stateful handling against the batch's working set.
    ///
    /// Returns `Ok(None)` if this protocol does not own the action kind.
    fn handle(
        &self,
        ctx: &RunActionsCtx<'_>,
        action: &Action,
        ws: &mut WorkingSet,
    ) -> ExecResult<Option<Receipt>>;

    /// The fee-sink capability, if this protocol collects fees.
    fn fee_sink(&self) -> Option<&dyn FeeSink> {
        None
    }
}

/// Accepts collected gas fees into protocol-owned state.
pub trait FeeSink {
    /// Stage a deposit of `amount` into the same working set as the action
    /// that paid it.
    fn deposit_fee(
        &self,
        ctx: &RunActionsCtx<'_>,
        ws: &mut WorkingSet,
        amount: &BigUint,
    ) -> ExecResult<()>;
}

/// Installed protocols by identifier.
#[derive(Default)]
pub struct Registry {
    by_id: BTreeMap<String, usize>,
    protocols: Vec<Arc<dyn Protocol>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `protocol` under `id`.
    pub fn register(&mut self, id: impl Into<String>, protocol: Arc<dyn Protocol>) -> ExecResult<()> {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(ExecError::DuplicateProtocol(id));
        }
        self.by_id.insert(id, self.protocols.len());
        self.protocols.push(protocol);
        Ok(())
    }

    /// Install `protocol` under its own [`Protocol::id`].
    pub fn register_protocol(&mut self, protocol: Arc<dyn Protocol>) -> ExecResult<()> {
        let id = protocol.id().to_owned();
        self.register(id, protocol)
    }

    pub fn find(&self, id: &str) -> ExecResult<Arc<dyn Protocol>> {
        self.by_id
            .get(id)
            .map(|idx| Arc::clone(&self.protocols[*idx]))
            .ok_or_else(|| ExecError::ProtocolNotFound(id.to_owned()))
    }

    /// Protocols in registration order.
    pub fn all(&self) -> &[Arc<dyn Protocol>] {
        &self.protocols
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Run every protocol's stateless checks, stopping at the first rejection.
    pub fn validate(&self, action: &Action) -> Result<(), ValidationError> {
        self.protocols.iter().try_for_each(|p| p.validate(action))
    }

    /// Dispatch `action` to the first protocol that handles it.
    pub fn handle(
        &self,
        ctx: &RunActionsCtx<'_>,
        action: &Action,
        ws: &mut WorkingSet,
    ) -> ExecResult<Receipt> {
        for protocol in &self.protocols {
            if let Some(receipt) = protocol.handle(ctx, action, ws)? {
                return Ok(receipt);
            }
        }
        Err(ExecError::Unhandled)
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("protocols", &self.by_id.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str);

    impl Protocol for Noop {
        fn id(&self) -> &str {
            self.0
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
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = Registry::new();
        let protocol: Arc<dyn Protocol> = Arc::new(Noop("noop"));
        registry.register("noop", protocol.clone()).unwrap();

        let found = registry.find("noop").unwrap();
        assert!(Arc::ptr_eq(&found, &protocol));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry.register_protocol(Arc::new(Noop("a"))).unwrap();
        let err = registry.register_protocol(Arc::new(Noop("a"))).unwrap_err();
        assert_eq!(err, ExecError::DuplicateProtocol("a".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_find_missing() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.find("rewarding").err(),
            Some(ExecError::ProtocolNotFound("rewarding".into()))
        );
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = Registry::new();
        registry.register_protocol(Arc::new(Noop("z"))).unwrap();
        registry.register_protocol(Arc::new(Noop("a"))).unwrap();
        let ids: Vec<&str> = registry.all().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
