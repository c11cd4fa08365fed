//! Source verification on Etherscan.
//!
//! Uses the multichain v2 API: one endpoint, the chain is selected with the
//! `chainid` query parameter.

use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;
use url::Url;

use crate::{Artifacts, DeploymentArgs, SourceVerifier, rpc};

/// Etherscan v2 API endpoint.
pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Delay between submission and status polls.
const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(5);

/// Maximum number of status polls (and of submission attempts while the
/// explorer has not indexed the contract yet).
const DEFAULT_MAX_POLLS: usize = 12;

/// Raw Etherscan response envelope.
#[derive(Debug, Clone, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    /// Accepted; poll this GUID.
    Queued(String),
    AlreadyVerified,
}

/// Outcome of a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
enum VerificationState {
    Pending,
    Verified,
    Failed(String),
}

/// Errors worth another attempt after a delay.
#[derive(Debug, thiserror::Error)]
enum Transient {
    #[error("contract not indexed by the explorer yet")]
    NotIndexed,
    #[error("verification pending")]
    Pending,
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl Transient {
    fn is_retryable(&self) -> bool {
        !matches!(self, Transient::Fatal(_))
    }
}

fn is_already_verified(text: &str) -> bool {
    text.to_lowercase().contains("already verified")
}

fn parse_submission(response: EtherscanResponse) -> Result<Submission, Transient> {
    if response.status == "1" {
        return Ok(Submission::Queued(response.result));
    }
    if is_already_verified(&response.result) {
        return Ok(Submission::AlreadyVerified);
    }
    if response.result.contains("Unable to locate ContractCode") {
        return Err(Transient::NotIndexed);
    }

    Err(anyhow::anyhow!(
        "Etherscan rejected the submission: {} ({})",
        response.result,
        response.message
    )
    .into())
}

fn parse_status(response: EtherscanResponse) -> VerificationState {
    let result = response.result;
    if result.contains("Pending in queue") {
        VerificationState::Pending
    } else if response.status == "1" || is_already_verified(&result) {
        VerificationState::Verified
    } else {
        VerificationState::Failed(result)
    }
}

/// Verifies one contract's source on Etherscan.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    chain_id: u64,
    artifacts: Artifacts,
    contract: String,
    poll_delay: Duration,
    max_polls: usize,
}

impl EtherscanVerifier {
    pub fn new(
        api_key: impl Into<String>,
        chain_id: u64,
        artifacts: Artifacts,
        contract: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            api_url: Url::parse(ETHERSCAN_API_URL).context("Invalid Etherscan API URL")?,
            api_key: api_key.into(),
            chain_id,
            artifacts,
            contract: contract.into(),
            poll_delay: DEFAULT_POLL_DELAY,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    /// Override the API endpoint (explorers compatible with the Etherscan API).
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.poll_delay)
            .with_max_times(self.max_polls)
    }

    fn endpoint(&self) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("chainid", &self.chain_id.to_string());
        url
    }

    async fn submit(&self, address: Address, args: &DeploymentArgs) -> Result<Submission, Transient> {
        let artifact = self.artifacts.load(&self.contract)?;
        let build_info = self.artifacts.build_info(&self.contract)?;
        let source_code = serde_json::to_string(&build_info.input)
            .context("Failed to serialize solc input")?;

        let form = [
            ("apikey", self.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("sourceCode", source_code),
            ("contractaddress", address.to_checksum(None)),
            ("contractname", artifact.fully_qualified_name()),
            ("compilerversion", format!("v{}", build_info.solc_long_version)),
            // The misspelling is part of the Etherscan API.
            ("constructorArguements", args.abi_encode_hex()),
        ];

        let response: EtherscanResponse = self
            .client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .context("Failed to send verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        parse_submission(response)
    }

    async fn check(&self, guid: &str) -> Result<VerificationState> {
        let response: EtherscanResponse = self
            .client
            .get(self.endpoint())
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to send verification status request")?
            .json()
            .await
            .context("Failed to parse verification status response")?;

        Ok(parse_status(response))
    }
}

impl SourceVerifier for EtherscanVerifier {
    async fn verify(&self, address: Address, args: &DeploymentArgs) -> Result<()> {
        let submission = (|| self.submit(address, args))
            .retry(self.backoff())
            .when(Transient::is_retryable)
            .notify(|err, delay| {
                tracing::debug!(error = %err, ?delay, "Etherscan not ready, retrying submission");
            })
            .await
            .map_err(|e| anyhow::anyhow!(e))?;

        let guid = match submission {
            Submission::AlreadyVerified => {
                tracing::info!(address = %address, "Contract is already verified");
                return Ok(());
            }
            Submission::Queued(guid) => guid,
        };
        tracing::info!(address = %address, guid = %guid, "Verification submitted");

        let guid = guid.as_str();
        let outcome = (|| async move {
            match self.check(guid).await {
                Ok(VerificationState::Pending) => Err(Transient::Pending),
                Ok(state) => Ok(state),
                Err(e) => Err(Transient::Fatal(e)),
            }
        })
        .retry(self.backoff())
        .when(Transient::is_retryable)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

        match outcome {
            VerificationState::Failed(reason) => {
                anyhow::bail!("Etherscan could not verify {}: {}", address, reason)
            }
            _ => {
                tracing::info!(address = %address, "Contract verified");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{artifacts::tests::write_fundme_artifacts, stub::StubServer};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempdir::TempDir;

    fn response(status: &str, result: &str) -> EtherscanResponse {
        EtherscanResponse {
            status: status.to_string(),
            message: String::new(),
            result: result.to_string(),
        }
    }

    #[test]
    fn test_submission_queued() {
        let submission = parse_submission(response("1", "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn")).unwrap();
        assert_eq!(
            submission,
            Submission::Queued("ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string())
        );
    }

    #[test]
    fn test_submission_already_verified() {
        let submission =
            parse_submission(response("0", "Contract source code already verified")).unwrap();
        assert_eq!(submission, Submission::AlreadyVerified);
    }

    #[test]
    fn test_submission_not_indexed_is_retryable() {
        let err = parse_submission(response(
            "0",
            "Unable to locate ContractCode at 0x5fbdb2315678afecb367f032d93f642f64180aa3",
        ))
        .unwrap_err();
        assert!(matches!(err, Transient::NotIndexed));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_submission_rejected_is_fatal() {
        let err = parse_submission(response("0", "Invalid API Key")).unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn test_status_states() {
        assert_eq!(
            parse_status(response("0", "Pending in queue")),
            VerificationState::Pending
        );
        assert_eq!(
            parse_status(response("1", "Pass - Verified")),
            VerificationState::Verified
        );
        assert_eq!(
            parse_status(response("0", "Already Verified")),
            VerificationState::Verified
        );
        assert_eq!(
            parse_status(response("0", "Fail - Unable to verify")),
            VerificationState::Failed("Fail - Unable to verify".to_string())
        );
    }

    #[test]
    fn test_endpoint_carries_chain_id() {
        let verifier = EtherscanVerifier::new("key", 11155111, Artifacts::new("artifacts"), "FundMe")
            .unwrap();
        assert_eq!(
            verifier.endpoint().as_str(),
            "https://api.etherscan.io/v2/api?chainid=11155111"
        );
    }

    #[test]
    fn test_envelope_deserializes() {
        let parsed: EtherscanResponse = serde_json::from_str(
            r#"{"status":"1","message":"OK","result":"guid123"}"#,
        )
        .unwrap();
        assert_eq!(parsed.result, "guid123");
    }

    /// An explorer that queues the submission, then answers status polls in order.
    async fn explorer(statuses: &'static [(&'static str, &'static str)]) -> StubServer {
        let polls = AtomicUsize::new(0);
        StubServer::start(move |request| {
            if request.method == "POST" {
                return json!({"status": "1", "message": "OK", "result": "guid-1"});
            }
            let n = polls.fetch_add(1, Ordering::SeqCst).min(statuses.len() - 1);
            let (status, result) = statuses[n];
            json!({"status": status, "message": "", "result": result})
        })
        .await
    }

    fn verifier_for(temp_dir: &TempDir, explorer: &StubServer) -> EtherscanVerifier {
        write_fundme_artifacts(temp_dir.path(), "contracts");
        EtherscanVerifier::new("key", 11155111, Artifacts::new(temp_dir.path()), "FundMe")
            .unwrap()
            .api_url(explorer.url())
            .poll_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_verify_submits_then_polls_until_verified() {
        let temp_dir = TempDir::new("fundme-test").expect("Failed to create temp dir");
        let explorer = explorer(&[("0", "Pending in queue"), ("1", "Pass - Verified")]).await;
        let args = DeploymentArgs::from(vec![Address::repeat_byte(0xaa)]);

        verifier_for(&temp_dir, &explorer)
            .verify(Address::repeat_byte(0x42), &args)
            .await
            .expect("Verification should succeed");

        let requests = explorer.requests();
        assert_eq!(requests.len(), 3, "One submission and two status polls");

        let submission = &requests[0];
        assert_eq!(submission.method, "POST");
        assert!(submission.target.contains("chainid=11155111"));
        assert!(submission.body.contains("action=verifysourcecode"));
        assert!(
            submission.body.contains(&format!("constructorArguements={}", args.abi_encode_hex())),
            "Constructor args missing from {}",
            submission.body
        );
        assert!(requests[1].target.contains("action=checkverifystatus"));
        assert!(requests[2].target.contains("guid=guid-1"));
    }

    #[tokio::test]
    async fn test_verify_reports_explorer_failure() {
        let temp_dir = TempDir::new("fundme-test").expect("Failed to create temp dir");
        let explorer = explorer(&[("0", "Fail - Unable to verify")]).await;

        let err = verifier_for(&temp_dir, &explorer)
            .verify(Address::repeat_byte(0x42), &DeploymentArgs::default())
            .await
            .expect_err("Explorer failure must be an error");

        assert!(err.to_string().contains("Unable to verify"), "Unexpected error: {err:#}");
    }
}
