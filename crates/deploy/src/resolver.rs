//! Price feed resolution.
//!
//! Development networks read the mock aggregator address from the registry;
//! every other network reads the static table. The source is fixed when the
//! [`DependencySource`] is built, so a run can only ever query one of them.

use alloy_core::primitives::Address;

use crate::{
    ArtifactRegistry, DeployError, DeployResult, DevelopmentChains, Environment,
    NetworkConfigTable, NetworkIdentity,
};

/// Name of the mock price feed contract deployed on development networks.
pub const MOCK_AGGREGATOR_CONTRACT: &str = "MockV3Aggregator";

/// Where the price feed address comes from for this run.
#[derive(Debug)]
pub enum DependencySource<'a, R> {
    /// Read the mock deployment from the registry.
    Development { registry: &'a R, network: &'a str },
    /// Read the static config entry for the chain.
    Production {
        table: &'a NetworkConfigTable,
        chain_id: u64,
    },
}

impl<'a, R: ArtifactRegistry> DependencySource<'a, R> {
    /// Pick the source matching the network's environment.
    pub fn for_network(
        network: &'a NetworkIdentity,
        development_chains: &DevelopmentChains,
        registry: &'a R,
        table: &'a NetworkConfigTable,
    ) -> Self {
        match development_chains.classify(network) {
            Environment::Development => DependencySource::Development {
                registry,
                network: &network.name,
            },
            Environment::Production => DependencySource::Production {
                table,
                chain_id: network.chain_id,
            },
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            DependencySource::Development { .. } => Environment::Development,
            DependencySource::Production { .. } => Environment::Production,
        }
    }

    /// Resolve the price feed address.
    pub fn resolve_price_feed(&self) -> DeployResult<Address> {
        match self {
            DependencySource::Development { registry, network } => {
                let record = registry
                    .get(MOCK_AGGREGATOR_CONTRACT)
                    .map_err(DeployError::Registry)?
                    .ok_or_else(|| DeployError::MissingMockDependency {
                        contract: MOCK_AGGREGATOR_CONTRACT.to_string(),
                        network: network.to_string(),
                    })?;

                tracing::debug!(network, address = %record.address, "Using mock price feed");
                Ok(record.address)
            }
            DependencySource::Production { table, chain_id } => {
                let address = table.price_feed(*chain_id)?;
                tracing::debug!(chain_id, address = %address, "Using configured price feed");
                Ok(address)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeploymentArgs, DeploymentRecord, NetworkEntry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Registry that counts lookups and optionally holds a mock record.
    #[derive(Default)]
    struct CountingRegistry {
        mock: Option<Address>,
        lookups: AtomicUsize,
    }

    impl ArtifactRegistry for CountingRegistry {
        fn get(&self, contract: &str) -> anyhow::Result<Option<DeploymentRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            assert_eq!(contract, MOCK_AGGREGATOR_CONTRACT);
            Ok(self
                .mock
                .map(|address| DeploymentRecord::new(address, &DeploymentArgs::default())))
        }

        fn save(&self, _: &str, _: &DeploymentRecord) -> anyhow::Result<()> {
            unreachable!("resolution never writes")
        }
    }

    struct FailingRegistry;

    impl ArtifactRegistry for FailingRegistry {
        fn get(&self, _: &str) -> anyhow::Result<Option<DeploymentRecord>> {
            anyhow::bail!("disk on fire")
        }

        fn save(&self, _: &str, _: &DeploymentRecord) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    fn table() -> NetworkConfigTable {
        NetworkConfigTable::empty().with_entry(
            1,
            NetworkEntry {
                name: "mainnet".to_string(),
                eth_usd_price_feed: Some(Address::repeat_byte(0xaa)),
                block_confirmations: None,
            },
        )
    }

    #[test]
    fn test_development_reads_registry() {
        let registry = CountingRegistry {
            mock: Some(Address::repeat_byte(0x0c)),
            ..Default::default()
        };
        let table = table();
        let network = NetworkIdentity::new("hardhat", 1);

        let source =
            DependencySource::for_network(&network, &DevelopmentChains::default(), &registry, &table);

        assert_eq!(source.environment(), Environment::Development);
        // chain id 1 has a table entry, but development must ignore it.
        assert_eq!(source.resolve_price_feed().unwrap(), Address::repeat_byte(0x0c));
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_production_never_reads_registry() {
        let registry = CountingRegistry {
            mock: Some(Address::repeat_byte(0x0c)),
            ..Default::default()
        };
        let table = table();
        let network = NetworkIdentity::new("mainnet", 1);

        let source =
            DependencySource::for_network(&network, &DevelopmentChains::default(), &registry, &table);

        assert_eq!(source.resolve_price_feed().unwrap(), Address::repeat_byte(0xaa));
        assert_eq!(
            registry.lookups.load(Ordering::SeqCst),
            0,
            "Production resolution must not touch the registry"
        );
    }

    #[test]
    fn test_development_without_mock() {
        let registry = CountingRegistry::default();
        let table = table();
        let network = NetworkIdentity::new("localhost", 31337);

        let source =
            DependencySource::for_network(&network, &DevelopmentChains::default(), &registry, &table);

        let err = source.resolve_price_feed().unwrap_err();
        assert!(
            matches!(&err, DeployError::MissingMockDependency { contract, network }
                if contract == MOCK_AGGREGATOR_CONTRACT && network == "localhost"),
            "Unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_production_unknown_chain_does_not_fall_back_to_mock() {
        let registry = CountingRegistry {
            mock: Some(Address::repeat_byte(0x0c)),
            ..Default::default()
        };
        let table = table();
        let network = NetworkIdentity::new("goerli", 5);

        let source =
            DependencySource::for_network(&network, &DevelopmentChains::default(), &registry, &table);

        assert!(matches!(
            source.resolve_price_feed(),
            Err(DeployError::UnknownNetworkConfig { chain_id: 5 })
        ));
        assert_eq!(registry.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registry_failure_is_wrapped() {
        let table = table();
        let network = NetworkIdentity::new("hardhat", 31337);
        let source = DependencySource::for_network(
            &network,
            &DevelopmentChains::default(),
            &FailingRegistry,
            &table,
        );

        assert!(matches!(
            source.resolve_price_feed(),
            Err(DeployError::Registry(_))
        ));
    }
}
