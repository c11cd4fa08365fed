//! fundme-deploy - Network-aware deployment of the FundMe contract.
//!
//! A run resolves the ETH/USD price feed for the target network (a mock on
//! development networks, a configured address elsewhere), deploys `FundMe`
//! with it as constructor argument, and submits the source to Etherscan on
//! public networks when an API key is available.
//!
//! # Example
//!
//! ```no_run
//! use fundme_deploy::{
//!     Artifacts, DeployContext, DeploymentsDir, DevelopmentChains, EtherscanVerifier,
//!     FundMeScript, NetworkConfigTable, NetworkIdentity, RpcDeployer,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let network = NetworkIdentity::new("sepolia", 11155111);
//! let registry = DeploymentsDir::new("deployments", &network);
//! let deployer = RpcDeployer::new(
//!     "http://localhost:8545".parse()?,
//!     Artifacts::new("artifacts"),
//!     registry.clone(),
//! )?;
//! let verifier = EtherscanVerifier::new("API_KEY", 11155111, Artifacts::new("artifacts"), "FundMe")?;
//!
//! let ctx = DeployContext {
//!     network,
//!     development_chains: DevelopmentChains::default(),
//!     network_config: NetworkConfigTable::default(),
//!     deployer_account: deployer.default_account().await?,
//!     verification_enabled: true,
//! };
//!
//! let outcome = FundMeScript::run(&ctx, &deployer, &verifier, &registry).await?;
//! println!("FundMe deployed at {}", outcome.record.address);
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod chain;
mod config;
mod deployment;
mod error;
mod etherscan;
mod network;
mod registry;
mod resolver;
pub mod rpc;
mod script;
#[cfg(test)]
mod stub;
mod traits;

pub use artifacts::{Artifacts, BuildInfo, ContractArtifact};
pub use chain::RpcDeployer;
pub use config::{
    MAINNET_ETH_USD_FEED, NetworkConfigTable, NetworkEntry, POLYGON_ETH_USD_FEED,
    PRICE_FEED_FIELD, SEPOLIA_ETH_USD_FEED,
};
pub use deployment::{DeployOptions, DeploymentArgs, DeploymentRecord};
pub use error::{DeployError, DeployResult};
pub use etherscan::{ETHERSCAN_API_URL, EtherscanVerifier};
pub use network::{DEFAULT_DEVELOPMENT_CHAINS, DevelopmentChains, Environment, NetworkIdentity};
pub use registry::{CHAIN_ID_FILENAME, DeploymentsDir};
pub use resolver::{DependencySource, MOCK_AGGREGATOR_CONTRACT};
pub use script::{
    DEFAULT_CONFIRMATIONS, DeployContext, DeploymentOutcome, FundMeScript, SkipReason,
    VerificationStatus,
};
pub use traits::{ArtifactRegistry, ContractDeployer, SourceVerifier};
