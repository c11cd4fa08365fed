//! Static per-chain network configuration.
//!
//! The table maps a chain id to the addresses and settings a production
//! deployment needs. It is serialised in TOML as:
//!
//! ```toml
//! [networks.11155111]
//! name = "sepolia"
//! ethUsdPriceFeed = "0x694AA1769357215DE4FAC081bf1f309aDC325306"
//! blockConfirmations = 6
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use alloy_core::primitives::{Address, address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{DeployError, DeployResult};

/// Name of the price feed field, as written in the config file.
pub const PRICE_FEED_FIELD: &str = "ethUsdPriceFeed";

/// Chainlink ETH/USD aggregator on Ethereum mainnet.
pub const MAINNET_ETH_USD_FEED: Address = address!("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419");
/// Chainlink ETH/USD aggregator on Sepolia.
pub const SEPOLIA_ETH_USD_FEED: Address = address!("0x694AA1769357215DE4FAC081bf1f309aDC325306");
/// Chainlink ETH/USD aggregator on Polygon PoS.
pub const POLYGON_ETH_USD_FEED: Address = address!("0xF9680D99D6C9589e2a93a78A04A279e509205945");

/// One row of the network table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    /// Human readable network name.
    pub name: String,
    /// Address of the ETH/USD price feed on this chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_usd_price_feed: Option<Address>,
    /// Confirmations to wait for after deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_confirmations: Option<u64>,
}

/// Static `chain id -> NetworkEntry` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, NetworkEntry>",
    into = "BTreeMap<String, NetworkEntry>"
)]
pub struct NetworkConfigTable(BTreeMap<u64, NetworkEntry>);

impl NetworkConfigTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace the entry for `chain_id`.
    pub fn with_entry(mut self, chain_id: u64, entry: NetworkEntry) -> Self {
        self.0.insert(chain_id, entry);
        self
    }

    /// Look up the entry for a chain.
    pub fn entry(&self, chain_id: u64) -> DeployResult<&NetworkEntry> {
        self.0
            .get(&chain_id)
            .ok_or(DeployError::UnknownNetworkConfig { chain_id })
    }

    /// The configured price feed address for a chain.
    pub fn price_feed(&self, chain_id: u64) -> DeployResult<Address> {
        self.entry(chain_id)?
            .eth_usd_price_feed
            .ok_or(DeployError::MissingConfigField {
                chain_id,
                field: PRICE_FEED_FIELD,
            })
    }

    /// Configured confirmations for a chain, if any.
    ///
    /// Unknown chains yield `None`: development networks have no table entry.
    pub fn block_confirmations(&self, chain_id: u64) -> Option<u64> {
        self.0
            .get(&chain_id)
            .and_then(|entry| entry.block_confirmations)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.keys().copied()
    }

    /// Save the table to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&NetworksFile {
            networks: self.clone(),
        })
        .context("Failed to serialize network config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write network config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Network config saved");
        Ok(())
    }

    /// Load the table from the `[networks]` section of a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Network config file not found: {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read network config from {}", path.display()))?;
        let file: NetworksFile =
            toml::from_str(&content).context("Failed to parse network config file as TOML")?;
        tracing::debug!(path = %path.display(), chains = file.networks.0.len(), "Network config loaded");
        Ok(file.networks)
    }
}

impl Default for NetworkConfigTable {
    fn default() -> Self {
        Self::empty()
            .with_entry(
                1,
                NetworkEntry {
                    name: "mainnet".to_string(),
                    eth_usd_price_feed: Some(MAINNET_ETH_USD_FEED),
                    block_confirmations: Some(6),
                },
            )
            .with_entry(
                11155111,
                NetworkEntry {
                    name: "sepolia".to_string(),
                    eth_usd_price_feed: Some(SEPOLIA_ETH_USD_FEED),
                    block_confirmations: Some(6),
                },
            )
            .with_entry(
                137,
                NetworkEntry {
                    name: "polygon".to_string(),
                    eth_usd_price_feed: Some(POLYGON_ETH_USD_FEED),
                    block_confirmations: None,
                },
            )
    }
}

impl TryFrom<BTreeMap<String, NetworkEntry>> for NetworkConfigTable {
    type Error = String;

    fn try_from(raw: BTreeMap<String, NetworkEntry>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(key, entry)| {
                key.parse::<u64>()
                    .map(|chain_id| (chain_id, entry))
                    .map_err(|_| format!("network key '{key}' is not a chain id"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl From<NetworkConfigTable> for BTreeMap<String, NetworkEntry> {
    fn from(table: NetworkConfigTable) -> Self {
        table
            .0
            .into_iter()
            .map(|(chain_id, entry)| (chain_id.to_string(), entry))
            .collect()
    }
}

/// On-disk layout: the table lives under a `networks` key.
#[derive(Serialize, Deserialize)]
struct NetworksFile {
    networks: NetworkConfigTable,
}
