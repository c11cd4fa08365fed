//! Source verification capability.

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;

use crate::DeploymentArgs;

/// Registers deployed source code with a block explorer.
pub trait SourceVerifier: Send + Sync {
    fn verify(
        &self,
        address: Address,
        args: &DeploymentArgs,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// `None` stands for "no explorer credentials": verification is unavailable.
impl<V: SourceVerifier> SourceVerifier for Option<V> {
    async fn verify(&self, address: Address, args: &DeploymentArgs) -> Result<()> {
        match self {
            Some(verifier) => verifier.verify(address, args).await,
            None => anyhow::bail!("No source verifier configured"),
        }
    }
}
