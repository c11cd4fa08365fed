//! Contract deployment capability.

use std::future::Future;

use anyhow::Result;

use crate::{DeployOptions, DeploymentRecord};

/// Deploys a named contract and returns its record.
///
/// Implementations may block until `options.confirmations` blocks have been
/// observed. Errors are returned as-is to the caller; no retry is expected.
pub trait ContractDeployer: Send + Sync {
    fn deploy(
        &self,
        contract: &str,
        options: DeployOptions,
    ) -> impl Future<Output = Result<DeploymentRecord>> + Send;
}
