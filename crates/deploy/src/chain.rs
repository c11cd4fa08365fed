//! Contract deployment over JSON-RPC.
//!
//! Transactions are sent with `eth_sendTransaction`, so the node must hold the
//! sender's key (local nodes expose unlocked dev accounts).

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::{
    ArtifactRegistry, Artifacts, ContractDeployer, DeployOptions, DeploymentRecord,
    rpc::{self, DEFAULT_POLL_INTERVAL, deserialize_u64_from_hex},
};

/// How long to wait for a transaction to be mined and confirmed.
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(600);

/// The subset of a transaction receipt needed after a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    status: u64,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    block_number: u64,
    contract_address: Option<Address>,
}

/// Deploys contracts from compiled artifacts through a node's JSON-RPC API.
///
/// A contract whose latest record has the same bytecode and arguments, and
/// whose recorded address still holds code, is not deployed again; the
/// existing record is returned instead.
#[derive(Debug, Clone)]
pub struct RpcDeployer<R> {
    client: reqwest::Client,
    rpc_url: Url,
    artifacts: Artifacts,
    registry: R,
    poll_interval: Duration,
    timeout: Duration,
}

impl<R: ArtifactRegistry> RpcDeployer<R> {
    pub fn new(rpc_url: Url, artifacts: Artifacts, registry: R) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            rpc_url,
            artifacts,
            registry,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    /// Set the interval between receipt and block number polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum time to wait for mining and confirmations.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        rpc::json_rpc_call(&self.client, self.rpc_url.as_str(), method, params).await
    }

    /// The chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        rpc::chain_id(&self.client, self.rpc_url.as_str()).await
    }

    /// The first account managed by the node.
    pub async fn default_account(&self) -> Result<Address> {
        let accounts: Vec<Address> = self
            .call("eth_accounts", vec![])
            .await
            .context("Failed to list node accounts")?;
        accounts
            .into_iter()
            .next()
            .context("Node has no unlocked accounts - pass a deployer address explicitly")
    }

    async fn block_number(&self) -> Result<u64> {
        let number: String = self.call("eth_blockNumber", vec![]).await?;
        rpc::parse_hex_u64(&number).context("Invalid block number returned by node")
    }

    /// Whether the node holds code at `address`.
    async fn has_code(&self, address: Address) -> Result<bool> {
        let code: Bytes = self
            .call(
                "eth_getCode",
                vec![serde_json::json!(address), serde_json::json!("latest")],
            )
            .await
            .with_context(|| format!("Failed to fetch code at {address}"))?;
        Ok(!code.is_empty())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        rpc::poll_until_some(
            &format!("receipt of {tx_hash}"),
            self.timeout,
            self.poll_interval,
            || async move {
                self.call::<Option<TransactionReceipt>>(
                    "eth_getTransactionReceipt",
                    vec![serde_json::json!(tx_hash)],
                )
                .await
            },
        )
        .await
    }

    async fn wait_for_confirmations(&self, mined_at: u64, confirmations: u64) -> Result<()> {
        if confirmations <= 1 {
            return Ok(());
        }

        tracing::info!(block = mined_at, confirmations, "Waiting for confirmations...");
        rpc::wait_until_ready(
            &format!("{confirmations} confirmations"),
            self.timeout,
            self.poll_interval,
            || async move {
                let head = self.block_number().await?;
                Ok::<_, anyhow::Error>(is_confirmed(mined_at, head, confirmations).then_some(()))
            },
        )
        .await
    }
}

/// A transaction mined in `mined_at` has `head - mined_at + 1` confirmations.
fn is_confirmed(mined_at: u64, head: u64, confirmations: u64) -> bool {
    head.saturating_sub(mined_at) + 1 >= confirmations
}

impl<R: ArtifactRegistry> ContractDeployer for RpcDeployer<R> {
    async fn deploy(&self, contract: &str, options: DeployOptions) -> Result<DeploymentRecord> {
        let artifact = self.artifacts.load(contract)?;
        let bytecode_hash = artifact.bytecode_hash();

        if let Some(existing) = self.registry.get(contract)? {
            if existing.bytecode_hash == Some(bytecode_hash) && existing.has_args(&options.args) {
                if self.has_code(existing.address).await? {
                    tracing::info!(
                        contract,
                        address = %existing.address,
                        "Reusing existing deployment (bytecode and args unchanged)"
                    );
                    return Ok(existing);
                }
                tracing::warn!(
                    contract,
                    address = %existing.address,
                    "Recorded deployment has no code on chain, redeploying"
                );
            }
        }

        let data = artifact.deploy_data(&options.args.abi_encode());
        let tx_hash: B256 = self
            .call(
                "eth_sendTransaction",
                vec![serde_json::json!({
                    "from": options.from,
                    "data": data,
                })],
            )
            .await
            .with_context(|| format!("Failed to send deployment transaction for {contract}"))?;

        tracing::info!(contract, tx_hash = %tx_hash, "Deployment transaction sent");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if receipt.status == 0 {
            anyhow::bail!(
                "Deployment of {} reverted in transaction {} (block {})",
                contract,
                tx_hash,
                receipt.block_number
            );
        }
        let address = receipt
            .contract_address
            .with_context(|| format!("Receipt of {tx_hash} has no contract address"))?;

        self.wait_for_confirmations(receipt.block_number, options.confirmations)
            .await?;

        let record = DeploymentRecord {
            transaction_hash: Some(tx_hash),
            bytecode_hash: Some(bytecode_hash),
            deployed_at: Some(chrono::Utc::now()),
            ..DeploymentRecord::new(address, &options.args)
        };

        tracing::info!(
            contract,
            address = %address,
            block = receipt.block_number,
            "Contract deployed"
        );
        self.registry.save(contract, &record)?;

        Ok(record)
    }
}
