//! Deployment data shared by the orchestrator and its collaborators.

use alloy_core::primitives::{Address, B256, Bytes};
use chrono::{DateTime, Utc};
use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered constructor arguments.
///
/// The same value is handed to the deployer and to the verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Deref, From)]
#[serde(transparent)]
pub struct DeploymentArgs(Vec<Address>);

impl DeploymentArgs {
    /// ABI-encode the arguments as a constructor tail: one left-padded word per address.
    pub fn abi_encode(&self) -> Bytes {
        self.0
            .iter()
            .flat_map(|address| address.into_word().0)
            .collect::<Vec<u8>>()
            .into()
    }

    /// Hex form without `0x` prefix, as explorers expect it.
    pub fn abi_encode_hex(&self) -> String {
        hex::encode(self.abi_encode())
    }

    /// JSON form stored in deployment records: checksummed address strings.
    pub fn to_json(&self) -> Vec<Value> {
        self.0
            .iter()
            .map(|address| Value::String(address.to_checksum(None)))
            .collect()
    }
}

/// Options passed to a [`ContractDeployer`](crate::ContractDeployer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// The submitting account.
    pub from: Address,
    /// Constructor arguments.
    pub args: DeploymentArgs,
    /// Confirmations to wait for before returning.
    pub confirmations: u64,
}

/// The persisted result of a successful deployment.
///
/// Arguments are kept as JSON values: records of other contracts (the mock
/// aggregator takes integers) live in the same registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// SHA-256 of the creation bytecode, used to detect unchanged redeploys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    /// A bare record with only the address and arguments.
    pub fn new(address: Address, args: &DeploymentArgs) -> Self {
        Self {
            address,
            args: args.to_json(),
            transaction_hash: None,
            bytecode_hash: None,
            deployed_at: None,
        }
    }

    /// Whether this record was deployed with exactly `args`.
    pub fn has_args(&self, args: &DeploymentArgs) -> bool {
        self.args == args.to_json()
    }
}
