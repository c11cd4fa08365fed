//! Error taxonomy for a deployment run.

use thiserror::Error;

/// Result type alias for deployment runs.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that abort a deployment run.
///
/// Resolution errors (`UnknownNetworkConfig`, `MissingConfigField`,
/// `MissingMockDependency`) are configuration mistakes and always name the
/// missing key. The remaining variants wrap adapter failures untouched.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The static network table has no entry for this chain.
    #[error("no network config entry for chain id {chain_id}")]
    UnknownNetworkConfig { chain_id: u64 },

    /// The network table entry exists but lacks a required field.
    #[error("network config entry for chain id {chain_id} is missing field '{field}'")]
    MissingConfigField { chain_id: u64, field: &'static str },

    /// The mock dependency was never deployed on this development network.
    #[error(
        "no deployment of '{contract}' found on network '{network}' - deploy the mocks first"
    )]
    MissingMockDependency { contract: String, network: String },

    /// The artifact registry could not be read.
    #[error("artifact registry lookup failed")]
    Registry(#[source] anyhow::Error),

    /// The deployer failed (network error, reverted constructor, insufficient funds...).
    #[error("deployment failed")]
    Deployment(#[source] anyhow::Error),

    /// The verification service call failed.
    #[error("verification failed")]
    Verification(#[source] anyhow::Error),
}
