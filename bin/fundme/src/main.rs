//! fundme deploys the FundMe contract with the ETH/USD price feed that fits the target network.

mod cli;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use fundme_deploy::{
    Artifacts, DeployContext, DeploymentsDir, EtherscanVerifier, FundMeScript, NetworkIdentity,
    RpcDeployer, rpc,
};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let settings = Settings::load(&cli)?;

    if !FundMeScript::should_run(&settings.tags) {
        tracing::info!(
            requested = ?settings.tags,
            tags = ?FundMeScript::TAGS,
            "No matching tag, skipping FundMe deployment"
        );
        return Ok(());
    }

    deploy(settings).await
}

async fn deploy(settings: Settings) -> Result<()> {
    let chain_id = match settings.chain_id {
        Some(chain_id) => chain_id,
        None => {
            let client = rpc::create_client()?;
            rpc::chain_id(&client, settings.rpc_url.as_str())
                .await
                .with_context(|| format!("Failed to reach node at {}", settings.rpc_url))?
        }
    };
    let network = NetworkIdentity::new(&settings.network, chain_id);

    tracing::info!(
        network = %network.name,
        chain_id,
        rpc_url = %settings.rpc_url,
        artifacts = %settings.artifacts.display(),
        deployments = %settings.deployments.display(),
        "Starting FundMe deployment..."
    );

    let artifacts = Artifacts::new(&settings.artifacts);
    let registry = DeploymentsDir::new(&settings.deployments, &network);
    let deployer = RpcDeployer::new(settings.rpc_url.clone(), artifacts.clone(), registry.clone())?;

    let deployer_account = match settings.deployer {
        Some(account) => account,
        None => deployer.default_account().await?,
    };

    let verifier = settings
        .etherscan_api_key
        .as_deref()
        .map(|api_key| {
            EtherscanVerifier::new(api_key, chain_id, artifacts, FundMeScript::CONTRACT_NAME)
        })
        .transpose()?;

    let ctx = DeployContext {
        network,
        development_chains: settings.development_chains,
        network_config: settings.networks,
        deployer_account,
        verification_enabled: verifier.is_some(),
    };

    // A failed verification is logged by the script and does not fail the run.
    FundMeScript::run(&ctx, &deployer, &verifier, &registry).await?;

    Ok(())
}
