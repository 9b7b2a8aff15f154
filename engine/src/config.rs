//! Chain configuration consumed by the engine.
//!
//! Loading these from disk belongs to the node; the engine only defines the
//! shapes and their defaults.

use std::str::FromStr;

use ledger_primitives::{
    Account, Address, BigUint, ExecError, ExecResult, IntrinsicGasConfig, MAX_PAYLOAD_BYTES,
};
use serde::{Deserialize, Serialize};

/// When a transfer into a contract account is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractDeliveryPolicy {
    /// Refuse transfers that carry a payload; plain value transfers go through.
    #[default]
    RejectWithPayload,
    /// Refuse every transfer into a contract account.
    RejectAll,
}

impl ContractDeliveryPolicy {
    /// Whether delivery into a contract account is blocked for `payload`.
    pub fn blocks(self, payload: &[u8]) -> bool {
        match self {
            Self::RejectWithPayload => !payload.is_empty(),
            Self::RejectAll => true,
        }
    }
}

/// Transfer protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub intrinsic_gas: IntrinsicGasConfig,
    pub contract_delivery: ContractDeliveryPolicy,
    pub max_payload_bytes: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            intrinsic_gas: IntrinsicGasConfig::default(),
            contract_delivery: ContractDeliveryPolicy::default(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
        }
    }
}

/// One pre-funded account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    /// Decimal string; balances are not bounded by any fixed-width integer.
    pub balance: String,
    /// Hex-encoded code hash for contract accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<String>,
}

/// Initial state of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub accounts: Vec<GenesisAccount>,
}

impl GenesisConfig {
    /// Parse every entry into an address and its initial account.
    pub fn accounts(&self) -> ExecResult<Vec<(Address, Account)>> {
        self.accounts.iter().map(GenesisAccount::parse).collect()
    }
}

impl GenesisAccount {
    fn parse(&self) -> ExecResult<(Address, Account)> {
        let address = Address::from_str(&self.address)
            .map_err(|e| ExecError::InvalidConfig(format!("genesis address {}: {}", self.address, e)))?;
        let balance = BigUint::from_str(&self.balance).map_err(|e| {
            ExecError::InvalidConfig(format!("genesis balance for {}: {}", self.address, e))
        })?;
        let code_hash = match &self.code_hash {
            Some(code) => hex::decode(code.trim_start_matches("0x")).map_err(|e| {
                ExecError::InvalidConfig(format!("genesis code hash for {}: {}", self.address, e))
            })?,
            None => Vec::new(),
        };
        Ok((
            address,
            Account {
                balance,
                sequence_number: 0,
                code_hash,
            },
        ))
    }
}
