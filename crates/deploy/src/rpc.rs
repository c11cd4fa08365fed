//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between polling attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    parse_rpc_response(method, result)
}

/// Fetch the chain id reported by the node at `url`.
pub async fn chain_id(client: &reqwest::Client, url: &str) -> Result<u64, anyhow::Error> {
    let chain_id: String = json_rpc_call(client, url, "eth_chainId", vec![])
        .await
        .context("Failed to fetch chain id")?;
    parse_hex_u64(&chain_id).context("Invalid chain id returned by node")
}

/// Extract the `result` member of a JSON-RPC response, surfacing `error` members.
fn parse_rpc_response<T: DeserializeOwned>(method: &str, response: Value) -> anyhow::Result<T> {
    if let Some(error) = response.get("error") {
        anyhow::bail!(
            "RPC error from {}: {}",
            method,
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = response
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Wait until `check_fn` yields a value, polling at a fixed interval.
///
/// # Arguments
/// * `name` - What is being waited for (for error messages)
/// * `timeout` - Maximum time to wait
/// * `check_fn` - Returns `Ok(Some(_))` when done, `Ok(None)` to keep waiting
///
/// Errors from `check_fn` are logged and retried until the timeout elapses;
/// the last one is reported in the timeout error.
pub async fn wait_until_ready<T, F, Fut>(
    name: &str,
    timeout: Duration,
    interval: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let mut last_error: Option<anyhow::Error> = None;

    loop {
        if start.elapsed() > timeout {
            return Err(match last_error {
                Some(e) => e.context(format!("Timeout waiting for {name}")),
                None => anyhow::anyhow!("Timeout waiting for {}", name),
            });
        }

        match check_fn().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                tracing::trace!(target_name = %name, "Not ready yet, polling again...");
            }
            Err(e) => {
                tracing::debug!(error = %format!("{e:#}"), target_name = %name, "Check failed, retrying...");
                last_error = Some(e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Poll `check_fn` until it yields a value.
///
/// Unlike [`wait_until_ready`], an error from `check_fn` ends the wait at once:
/// only `Ok(None)` means "not there yet".
pub async fn poll_until_some<T, F, Fut>(
    name: &str,
    timeout: Duration,
    interval: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>, anyhow::Error>>,
{
    let start = std::time::Instant::now();

    loop {
        if let Some(value) = check_fn()
            .await
            .with_context(|| format!("Failed while waiting for {name}"))?
        {
            return Ok(value);
        }
        if start.elapsed() > timeout {
            anyhow::bail!("Timeout waiting for {}", name);
        }

        tracing::trace!(target_name = %name, "Not there yet, polling again...");
        tokio::time::sleep(interval).await;
    }
}

/// Deserialize a u64 from a hex quantity string (with 0x prefix).
pub fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_hex_u64(&s).map_err(serde::de::Error::custom)
}

/// Parse a hex quantity such as `0x1a`.
pub fn parse_hex_u64(s: &str) -> Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
}
