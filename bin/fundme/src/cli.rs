use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fundme")]
#[command(
    author,
    version,
    about = "Deploy FundMe with the ETH/USD price feed of the target network"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "FUNDME_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a TOML settings file.
    ///
    /// If not provided, `fundme.toml` in the current directory is used when present.
    #[arg(short, long, env = "FUNDME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the target network (e.g. hardhat, localhost, sepolia).
    ///
    /// Networks listed in `development_chains` get the locally deployed mock feed.
    #[arg(short, long)]
    pub network: Option<String>,

    /// JSON-RPC endpoint of the target node.
    #[arg(long, alias = "rpc")]
    pub rpc_url: Option<Url>,

    /// Chain id of the target network.
    ///
    /// If not provided, it is fetched from the node with `eth_chainId`.
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Account sending the deployment transaction.
    ///
    /// If not provided, the first account managed by the node is used.
    #[arg(long, alias = "from")]
    pub deployer: Option<Address>,

    /// Only run if one of these tags matches the script's tags (all, fundme).
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Hardhat artifacts directory.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Directory holding per-network deployment records.
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// Etherscan API key. Source verification is skipped without it.
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "fundme",
            "--network",
            "sepolia",
            "--rpc-url",
            "https://rpc.sepolia.org",
            "--chain-id",
            "11155111",
            "--deployer",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "--tags",
            "fundme,mocks",
            "-v",
            "debug",
        ])
        .expect("Failed to parse command line");

        assert_eq!(cli.network.as_deref(), Some("sepolia"));
        assert_eq!(cli.chain_id, Some(11155111));
        assert_eq!(
            cli.tags,
            Some(vec!["fundme".to_string(), "mocks".to_string()])
        );
        assert_eq!(cli.verbosity, LevelFilter::DEBUG);
        assert!(cli.deployer.is_some());
    }

    #[test]
    fn test_rejects_invalid_deployer() {
        let result = Cli::try_parse_from(["fundme", "--deployer", "0x1234"]);
        assert!(result.is_err(), "Short address should be rejected");
    }
}
