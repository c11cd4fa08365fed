//! File-backed deployment registry.
//!
//! Records are laid out the way hardhat-deploy lays them out:
//!
//! ```text
//! deployments/
//!   <network>/
//!     .chainId
//!     MockV3Aggregator.json
//!     FundMe.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{ArtifactRegistry, DeploymentRecord, NetworkIdentity};

/// Name of the marker file holding the chain id of a network directory.
pub const CHAIN_ID_FILENAME: &str = ".chainId";

/// Deployment records of one network, stored under `<root>/<network>/`.
#[derive(Debug, Clone)]
pub struct DeploymentsDir {
    network_dir: PathBuf,
    chain_id: u64,
}

impl DeploymentsDir {
    pub fn new(root: impl AsRef<Path>, network: &NetworkIdentity) -> Self {
        Self {
            network_dir: root.as_ref().join(&network.name),
            chain_id: network.chain_id,
        }
    }

    pub fn network_dir(&self) -> &Path {
        &self.network_dir
    }

    fn record_path(&self, contract: &str) -> PathBuf {
        self.network_dir.join(format!("{contract}.json"))
    }

    /// Fail if the directory's chain id marker names another chain.
    ///
    /// A directory without a marker is accepted.
    fn check_chain_id(&self) -> Result<()> {
        let marker = self.network_dir.join(CHAIN_ID_FILENAME);
        if !marker.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&marker)
            .with_context(|| format!("Failed to read {}", marker.display()))?;
        let recorded: u64 = content
            .trim()
            .parse()
            .with_context(|| format!("Invalid chain id in {}", marker.display()))?;
        if recorded != self.chain_id {
            anyhow::bail!(
                "Deployments in {} belong to chain id {}, not {}",
                self.network_dir.display(),
                recorded,
                self.chain_id
            );
        }

        Ok(())
    }

    /// Create the network directory and its chain id marker if missing.
    fn ensure_network_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.network_dir).with_context(|| {
            format!(
                "Failed to create deployments directory {}",
                self.network_dir.display()
            )
        })?;

        let marker = self.network_dir.join(CHAIN_ID_FILENAME);
        if !marker.exists() {
            std::fs::write(&marker, self.chain_id.to_string())
                .with_context(|| format!("Failed to write {}", marker.display()))?;
            tracing::debug!(path = %marker.display(), chain_id = self.chain_id, "Wrote chain id marker");
        }

        Ok(())
    }
}

impl ArtifactRegistry for DeploymentsDir {
    fn get(&self, contract: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(contract);
        if !path.exists() {
            tracing::debug!(contract, path = %path.display(), "No deployment record");
            return Ok(None);
        }

        self.check_chain_id()?;

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read deployment record {}", path.display()))?;
        let record: DeploymentRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment record {}", path.display()))?;

        Ok(Some(record))
    }

    fn save(&self, contract: &str, record: &DeploymentRecord) -> Result<()> {
        self.check_chain_id()?;
        self.ensure_network_dir()?;

        let path = self.record_path(contract);
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize deployment record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write deployment record {}", path.display()))?;

        tracing::info!(contract, address = %record.address, path = %path.display(), "Deployment record saved");
        Ok(())
    }
}
