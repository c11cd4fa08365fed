//! Network identity and development-environment classification.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default development network names.
///
/// `hardhat` and `localhost` are the in-process and local node networks of the
/// hardhat toolchain, `anvil` is Foundry's local node.
pub const DEFAULT_DEVELOPMENT_CHAINS: [&str; 3] = ["hardhat", "localhost", "anvil"];

/// The network a run targets, supplied by the caller at start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkIdentity {
    /// The network name (e.g. `sepolia`, `hardhat`).
    pub name: String,
    /// The EIP-155 chain id.
    pub chain_id: u64,
}

impl NetworkIdentity {
    pub fn new(name: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            chain_id,
        }
    }
}

/// Which kind of environment a network is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Environment {
    /// Local or ephemeral chain: dependencies are mocks from the registry.
    #[display("development")]
    Development,
    /// Any other chain: dependencies come from the static network table.
    #[display("production")]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Set of network names treated as development environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevelopmentChains(BTreeSet<String>);

impl DevelopmentChains {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Membership test on the network name.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn classify(&self, network: &NetworkIdentity) -> Environment {
        if self.contains(&network.name) {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for DevelopmentChains {
    fn default() -> Self {
        Self::new(DEFAULT_DEVELOPMENT_CHAINS)
    }
}
