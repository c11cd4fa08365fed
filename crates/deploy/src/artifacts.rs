//! Compiled contract artifacts.
//!
//! Reads the hardhat artifact layout:
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json
//!   contracts/FundMe.sol/FundMe.json
//!   contracts/FundMe.sol/FundMe.dbg.json
//! ```

use std::path::{Path, PathBuf};

use alloy_core::primitives::{B256, Bytes};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Directory of solc build info files, skipped when searching for artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    #[serde(default)]
    pub abi: Value,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// `contracts/FundMe.sol:FundMe`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// SHA-256 of the creation bytecode.
    pub fn bytecode_hash(&self) -> B256 {
        B256::from_slice(&Sha256::digest(&self.bytecode))
    }

    /// Creation bytecode followed by encoded constructor arguments.
    pub fn deploy_data(&self, encoded_args: &[u8]) -> Bytes {
        let mut data = Vec::with_capacity(self.bytecode.len() + encoded_args.len());
        data.extend_from_slice(&self.bytecode);
        data.extend_from_slice(encoded_args);
        data.into()
    }
}

/// The `.dbg.json` file sitting next to each artifact.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// The solc compilation an artifact came out of.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// e.g. `0.8.8+commit.dddeac2f`.
    pub solc_long_version: String,
    /// Standard JSON input given to solc.
    pub input: Value,
}

/// A hardhat `artifacts/` directory.
#[derive(Debug, Clone)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the artifact file for `contract`.
    ///
    /// Tries `contracts/<Name>.sol/<Name>.json` first, then searches the tree.
    pub fn artifact_path(&self, contract: &str) -> Result<PathBuf> {
        let file_name = format!("{contract}.json");
        let conventional = self
            .root
            .join("contracts")
            .join(format!("{contract}.sol"))
            .join(&file_name);
        if conventional.exists() {
            return Ok(conventional);
        }

        find_file(&self.root, &file_name)?.with_context(|| {
            format!(
                "No artifact for '{}' under {} - has the project been compiled?",
                contract,
                self.root.display()
            )
        })
    }

    pub fn load(&self, contract: &str) -> Result<ContractArtifact> {
        let path = self.artifact_path(contract)?;
        read_json(&path)
    }

    /// Load the build info for `contract` through its debug file.
    pub fn build_info(&self, contract: &str) -> Result<BuildInfo> {
        let artifact_path = self.artifact_path(contract)?;
        let dbg_path = artifact_path.with_file_name(format!("{contract}.dbg.json"));
        let dbg: DebugFile = read_json(&dbg_path)?;

        // The build info path is relative to the debug file.
        let parent = dbg_path
            .parent()
            .context("Artifact path must have a parent directory")?;
        read_json(&parent.join(dbg.build_info))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Depth-first search for a file name, skipping the build info directory.
fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == BUILD_INFO_DIR) {
                continue;
            }
            if let Some(found) = find_file(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}
