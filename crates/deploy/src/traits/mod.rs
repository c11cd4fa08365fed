//! Capabilities the deployment script is composed from.
//!
//! The script itself only decides *what* to call. Chain access, explorer
//! access and record persistence sit behind these traits so that a run can be
//! driven against a live node or against in-memory fakes.

mod deployer;
mod registry;
mod verifier;

pub use deployer::ContractDeployer;
pub use registry::ArtifactRegistry;
pub use verifier::SourceVerifier;
