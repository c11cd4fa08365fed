//! The FundMe deployment script.
//!
//! A run is strictly sequential: classify the network, resolve the price
//! feed, deploy, then verify when the network is public and verification is
//! enabled.

use alloy_core::primitives::Address;

use crate::{
    ArtifactRegistry, ContractDeployer, DependencySource, DeployError, DeployOptions,
    DeployResult, DeploymentArgs, DeploymentRecord, DevelopmentChains, Environment,
    NetworkConfigTable, NetworkIdentity, SourceVerifier,
};

/// Confirmations waited for when the network config does not say otherwise.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Everything a run needs from its environment, passed explicitly.
#[derive(Debug, Clone)]
pub struct DeployContext {
    /// The network being deployed to.
    pub network: NetworkIdentity,
    /// Names of development networks.
    pub development_chains: DevelopmentChains,
    /// Static per-chain configuration.
    pub network_config: NetworkConfigTable,
    /// The account submitting the deployment.
    pub deployer_account: Address,
    /// Whether a verification service credential is available.
    pub verification_enabled: bool,
}

impl DeployContext {
    /// Confirmations to wait for on this network.
    pub fn confirmations(&self) -> u64 {
        self.network_config
            .block_confirmations(self.network.chain_id)
            .unwrap_or(DEFAULT_CONFIRMATIONS)
    }
}

/// Why verification did or did not happen.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum VerificationStatus {
    #[display("verified")]
    Verified,
    #[display("skipped ({_0})")]
    Skipped(SkipReason),
    #[display("failed: {_0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SkipReason {
    #[display("development network")]
    DevelopmentNetwork,
    #[display("no explorer API key")]
    VerificationDisabled,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
    pub verification: VerificationStatus,
}

/// Deploys `FundMe` with the network's ETH/USD price feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundMeScript;

impl FundMeScript {
    /// Contract name, as found in artifacts and deployment records.
    pub const CONTRACT_NAME: &'static str = "FundMe";

    /// Tags an external runner matches against.
    pub const TAGS: &'static [&'static str] = &["all", "fundme"];

    /// Whether this script belongs in a batch selected by `requested` tags.
    ///
    /// An empty selection runs everything.
    pub fn should_run<S: AsRef<str>>(requested: &[S]) -> bool {
        requested.is_empty()
            || requested
                .iter()
                .any(|tag| Self::TAGS.contains(&tag.as_ref()))
    }

    /// Whether the deployed contract should be sent to the explorer.
    pub fn verification_decision(
        environment: Environment,
        verification_enabled: bool,
    ) -> Result<(), SkipReason> {
        if environment.is_development() {
            Err(SkipReason::DevelopmentNetwork)
        } else if !verification_enabled {
            Err(SkipReason::VerificationDisabled)
        } else {
            Ok(())
        }
    }

    /// Run the script.
    pub async fn run<D, V, R>(
        ctx: &DeployContext,
        deployer: &D,
        verifier: &V,
        registry: &R,
    ) -> DeployResult<DeploymentOutcome>
    where
        D: ContractDeployer,
        V: SourceVerifier,
        R: ArtifactRegistry,
    {
        let source = DependencySource::for_network(
            &ctx.network,
            &ctx.development_chains,
            registry,
            &ctx.network_config,
        );
        let environment = source.environment();

        tracing::info!(
            network = %ctx.network.name,
            chain_id = ctx.network.chain_id,
            %environment,
            "Resolving price feed..."
        );
        let price_feed = source.resolve_price_feed()?;
        let args = DeploymentArgs::from(vec![price_feed]);

        let confirmations = ctx.confirmations();
        tracing::info!(
            contract = Self::CONTRACT_NAME,
            from = %ctx.deployer_account,
            price_feed = %price_feed,
            confirmations,
            "Deploying contract..."
        );
        let record = deployer
            .deploy(
                Self::CONTRACT_NAME,
                DeployOptions {
                    from: ctx.deployer_account,
                    args: args.clone(),
                    confirmations,
                },
            )
            .await
            .map_err(DeployError::Deployment)?;

        let verification =
            match Self::verification_decision(environment, ctx.verification_enabled) {
                Err(reason) => {
                    tracing::debug!(%reason, "Skipping verification");
                    VerificationStatus::Skipped(reason)
                }
                Ok(()) => {
                    tracing::info!(address = %record.address, "Verifying contract...");
                    match verifier.verify(record.address, &args).await {
                        Ok(()) => VerificationStatus::Verified,
                        Err(e) => {
                            let err = DeployError::Verification(e);
                            tracing::warn!(
                                address = %record.address,
                                error = ?err,
                                "Contract deployed but verification failed"
                            );
                            VerificationStatus::Failed(format!("{:#}", anyhow::Error::from(err)))
                        }
                    }
                }
            };

        tracing::info!(
            contract = Self::CONTRACT_NAME,
            address = %record.address,
            network = %ctx.network.name,
            %verification,
            "✓ Deployment complete!"
        );
        tracing::info!("---------------------------------------------------------------");

        Ok(DeploymentOutcome {
            record,
            verification,
        })
    }
}
