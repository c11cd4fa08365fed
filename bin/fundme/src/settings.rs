//! Layered run settings.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. `fundme.toml` in the current directory, or the `--config` file
//! 3. Environment variables with the `FUNDME_` prefix
//! 4. Command line flags

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use fundme_deploy::{DevelopmentChains, NetworkConfigTable};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::Cli;

/// Settings file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fundme.toml";

/// Prefix of environment variables read as settings.
const ENV_PREFIX: &str = "FUNDME_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Target network name.
    pub network: String,
    pub rpc_url: Url,
    /// Fetched from the node when unset.
    pub chain_id: Option<u64>,
    /// Defaults to the node's first account when unset.
    pub deployer: Option<Address>,
    pub etherscan_api_key: Option<String>,
    pub artifacts: PathBuf,
    pub deployments: PathBuf,
    pub development_chains: DevelopmentChains,
    /// Per-chain table. File entries are merged into the built-in ones.
    pub networks: NetworkConfigTable,
    /// Requested tags; empty runs the script.
    pub tags: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: "hardhat".to_string(),
            rpc_url: Url::parse("http://127.0.0.1:8545").expect("Default RPC URL is a valid URL"),
            chain_id: None,
            deployer: None,
            etherscan_api_key: None,
            artifacts: PathBuf::from("artifacts"),
            deployments: PathBuf::from("deployments"),
            development_chains: DevelopmentChains::default(),
            networks: NetworkConfigTable::default(),
            tags: Vec::new(),
        }
    }
}

/// Values given on the command line. Unset flags leave lower layers alone.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rpc_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployer: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etherscan_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployments: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            network: cli.network.clone(),
            rpc_url: cli.rpc_url.clone(),
            chain_id: cli.chain_id,
            deployer: cli.deployer,
            etherscan_api_key: cli.etherscan_api_key.clone(),
            artifacts: cli.artifacts.clone(),
            deployments: cli.deployments.clone(),
            tags: cli.tags.clone(),
        }
    }
}

impl Settings {
    /// Load settings for a command line invocation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) if !path.exists() => {
                anyhow::bail!("Config file not found: {}", path.display())
            }
            Some(path) => path.clone(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Self::figment(&config_path, cli)
            .extract::<Self>()
            .with_context(|| format!("Failed to load settings (config: {})", config_path.display()))
            .map(Self::normalize)
    }

    fn figment(config_path: &Path, cli: &Cli) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["verbosity", "config"]))
            .merge(Serialized::defaults(Overrides::from(cli)))
    }

    /// An empty API key counts as no key.
    fn normalize(mut self) -> Self {
        if self
            .etherscan_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.etherscan_api_key = None;
        }
        self
    }
}
