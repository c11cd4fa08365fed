//! Deployment record persistence.

use anyhow::Result;

use crate::DeploymentRecord;

/// Store of deployment records for one network, keyed by contract name.
pub trait ArtifactRegistry: Send + Sync {
    /// The most recent record for `contract`, or `None` if it was never deployed.
    fn get(&self, contract: &str) -> Result<Option<DeploymentRecord>>;

    /// Persist `record` as the latest deployment of `contract`.
    fn save(&self, contract: &str, record: &DeploymentRecord) -> Result<()>;
}
