//! `ledger-engine`: deterministic state transition engine.
//!
//! Given a committed state root and a batch of sealed actions, the engine
//! produces a new root and one outcome per action. Identical inputs always
//! yield identical roots and receipts.
//!
//! ## Architecture
//!
//! - [`store::StateStore`]: versioned committed state; [`store::MemStore`]
//!   keeps every version in memory
//! - [`working_set::WorkingSet`]: batch-scoped overlay, committed all at once
//! - [`account`]: loading and staging accounts
//! - [`registry::Registry`]: installed protocols, shared read-only
//! - [`transfer::TransferProtocol`]: value transfers and gas charging
//! - [`rewarding::RewardingProtocol`]: fee sink for collected gas
//! - [`executor::BlockExecutor`]: validates, handles and commits a batch

pub mod account;
pub mod config;
pub mod context;
pub mod executor;
pub mod registry;
pub mod rewarding;
pub mod store;
pub mod transfer;
pub mod working_set;

pub use config::{ContractDeliveryPolicy, GenesisAccount, GenesisConfig, ProtocolConfig};
pub use context::{validate_context, BlockContext, RunActionsCtx, SealedAction};
pub use executor::{ActionOutcome, BatchOutcome, BlockExecutor};
pub use registry::{FeeSink, Protocol, Registry};
pub use rewarding::{Fund, RewardingProtocol};
pub use store::{MemStore, StateStore};
pub use transfer::TransferProtocol;
pub use working_set::{StateValue, WorkingSet};
