//! Block-explorer source verification.

use std::future::Future;
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;
use url::Url;

use crate::artifacts::ArtifactStore;
use crate::context::ChainContext;
use crate::fulfillment::Sleeper;

/// Wait before submitting, giving the explorer time to index the new contract.
pub const DEFAULT_VERIFY_DELAY: Duration = Duration::from_secs(45);

/// Interval between two verification status checks.
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Number of status checks before giving up.
const STATUS_POLL_ATTEMPTS: usize = 12;

/// What to verify: a deployed address and the arguments it was constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub contract: String,
    pub address: Address,
    pub constructor_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    /// The verifier could not run (e.g. no API key).
    Skipped,
}

/// Submits contract sources to a block explorer.
pub trait ExplorerVerifier {
    fn verify(
        &self,
        ctx: &ChainContext,
        request: &VerificationRequest,
    ) -> impl Future<Output = Result<VerificationOutcome>> + Send;
}

impl<V: ExplorerVerifier + Sync> ExplorerVerifier for &V {
    fn verify(
        &self,
        ctx: &ChainContext,
        request: &VerificationRequest,
    ) -> impl Future<Output = Result<VerificationOutcome>> + Send {
        (**self).verify(ctx, request)
    }
}

/// Verify `request` if the chain is on the verification allow-list.
///
/// Returns `None` without touching the verifier on any other chain.
pub async fn verify_if_supported<V, S>(
    ctx: &ChainContext,
    verifier: &V,
    sleeper: &S,
    delay: Duration,
    request: &VerificationRequest,
) -> Result<Option<VerificationOutcome>>
where
    V: ExplorerVerifier,
    S: Sleeper,
{
    if !ctx.verification_enabled() {
        tracing::debug!(
            contract = %request.contract,
            chain_id = ctx.chain_id,
            "Explorer verification not available on this network"
        );
        return Ok(None);
    }

    tracing::info!(
        contract = %request.contract,
        address = %request.address,
        delay_secs = delay.as_secs(),
        "Waiting before explorer verification..."
    );
    sleeper.sleep(delay).await;

    let outcome = verifier.verify(ctx, request).await?;
    tracing::info!(contract = %request.contract, outcome = ?outcome, "Explorer verification done");
    Ok(Some(outcome))
}

/// Etherscan API response envelope.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

impl EtherscanResponse {
    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    fn already_verified(&self) -> bool {
        self.result.to_lowercase().contains("already verified")
    }
}

#[derive(Debug, thiserror::Error)]
enum StatusError {
    #[error("verification pending")]
    Pending,
    #[error("verification failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// [`ExplorerVerifier`] for Etherscan and its per-network deployments.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_key: Option<String>,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    poll_attempts: usize,
}

impl EtherscanVerifier {
    pub fn new(api_key: Option<String>, artifacts: ArtifactStore) -> Result<Self> {
        Ok(Self {
            client: crate::rpc::create_client()?,
            api_key,
            artifacts,
            poll_interval: STATUS_POLL_INTERVAL,
            poll_attempts: STATUS_POLL_ATTEMPTS,
        })
    }

    /// Check the verification status at most `attempts` times, `interval` apart.
    pub fn with_status_polling(mut self, interval: Duration, attempts: usize) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts.max(1);
        self
    }

    async fn submit(
        &self,
        api_url: &Url,
        api_key: &str,
        request: &VerificationRequest,
    ) -> Result<EtherscanResponse> {
        let artifact = self.artifacts.load(&request.contract)?;
        let build_info = self.artifacts.build_info(&request.contract)?;
        let constructor_args = artifact.encode_constructor_args(&request.constructor_args)?;
        let source = serde_json::to_string(&build_info.input)
            .context("Failed to serialize compiler input")?;

        let form = [
            ("apikey", api_key.to_string()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("sourceCode", source),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", artifact.fully_qualified_name()),
            ("compilerversion", format!("v{}", build_info.solc_long_version)),
            // Etherscan's spelling.
            ("constructorArguements", hex::encode(&constructor_args)),
        ];

        self.client
            .post(api_url.clone())
            .form(&form)
            .send()
            .await
            .context("Failed to send verification request")?
            .json()
            .await
            .context("Failed to parse verification response")
    }

    async fn check_status(
        &self,
        api_url: &Url,
        api_key: &str,
        guid: &str,
    ) -> Result<(), StatusError> {
        let response: EtherscanResponse = self
            .client
            .get(api_url.clone())
            .query(&[
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to query verification status")?
            .json()
            .await
            .context("Failed to parse verification status")?;

        parse_status(&response)
    }
}

fn parse_status(response: &EtherscanResponse) -> Result<(), StatusError> {
    if response.is_ok() || response.already_verified() {
        return Ok(());
    }
    if response.result.to_lowercase().contains("pending") {
        return Err(StatusError::Pending);
    }
    Err(StatusError::Failed(response.result.clone()))
}

impl ExplorerVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        ctx: &ChainContext,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(
                contract = %request.contract,
                "No explorer API key configured, skipping verification"
            );
            return Ok(VerificationOutcome::Skipped);
        };
        let api_url = ctx.network.explorer_api_url()?;

        let submitted = self.submit(api_url, api_key, request).await?;
        if submitted.already_verified() {
            return Ok(VerificationOutcome::AlreadyVerified);
        }
        if !submitted.is_ok() {
            anyhow::bail!(
                "Verification of {} rejected: {} ({})",
                request.contract,
                submitted.result,
                submitted.message
            );
        }

        let guid = submitted.result;
        tracing::info!(contract = %request.contract, guid = %guid, "Verification submitted");

        (|| self.check_status(api_url, api_key, &guid))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    // Retries come after the first check.
                    .with_max_times(self.poll_attempts - 1),
            )
            .when(|e| matches!(e, StatusError::Pending))
            .notify(|_, after| {
                tracing::debug!(guid = %guid, retry_in = ?after, "Verification pending");
            })
            .await
            .map_err(|e| match e {
                StatusError::Transport(e) => e,
                other => anyhow::anyhow!("Verification of {}: {}", request.contract, other),
            })?;

        Ok(VerificationOutcome::Verified)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tempdir::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::artifacts::tests::write_artifacts;
    use crate::network::NetworkRegistry;

    #[derive(Default)]
    struct CountingVerifier {
        calls: Mutex<Vec<VerificationRequest>>,
    }

    impl ExplorerVerifier for CountingVerifier {
        async fn verify(
            &self,
            _ctx: &ChainContext,
            request: &VerificationRequest,
        ) -> Result<VerificationOutcome> {
            self.calls.lock().unwrap().push(request.clone());
            Ok(VerificationOutcome::Verified)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.sleeps.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            contract: "RandomNumberConsumer".to_string(),
            address: Address::repeat_byte(0x05),
            constructor_args: vec![],
        }
    }

    fn context(chain_id: u64) -> ChainContext {
        let network = NetworkRegistry::builtin().get(chain_id).unwrap().clone();
        ChainContext::new(network, Address::ZERO)
    }

    #[tokio::test]
    async fn test_local_network_never_verifies() {
        let verifier = CountingVerifier::default();
        let sleeper = RecordingSleeper::default();

        let outcome = verify_if_supported(
            &context(31337),
            &verifier,
            &sleeper,
            DEFAULT_VERIFY_DELAY,
            &request(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, None);
        assert!(verifier.calls.lock().unwrap().is_empty());
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_allow_listed_network_waits_then_verifies() {
        let verifier = CountingVerifier::default();
        let sleeper = RecordingSleeper::default();

        let outcome = verify_if_supported(
            &context(4),
            &verifier,
            &sleeper,
            DEFAULT_VERIFY_DELAY,
            &request(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Some(VerificationOutcome::Verified));
        assert_eq!(verifier.calls.lock().unwrap().as_slice(), &[request()]);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![DEFAULT_VERIFY_DELAY]
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_skips() {
        let verifier = EtherscanVerifier::new(None, ArtifactStore::new("artifacts")).unwrap();

        let outcome = verifier.verify(&context(1), &request()).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Skipped);
    }

    #[test]
    fn test_parse_status() {
        let response = |status: &str, result: &str| EtherscanResponse {
            status: status.to_string(),
            message: String::new(),
            result: result.to_string(),
        };

        assert!(parse_status(&response("1", "Pass - Verified")).is_ok());
        assert!(parse_status(&response("0", "Already Verified")).is_ok());
        assert!(matches!(
            parse_status(&response("0", "Pending in queue")),
            Err(StatusError::Pending)
        ));
        assert!(matches!(
            parse_status(&response("0", "Fail - Unable to verify")),
            Err(StatusError::Failed(_))
        ));
    }

    const PENDING: &str = r#"{"status":"0","message":"NOTOK","result":"Pending in queue"}"#;
    const PASS: &str = r#"{"status":"1","message":"OK","result":"Pass - Verified"}"#;
    const FAIL: &str = r#"{"status":"0","message":"NOTOK","result":"Fail - Unable to verify"}"#;
    const SUBMITTED: &str = r#"{"status":"1","message":"OK","result":"guid-1234"}"#;
    const ALREADY_VERIFIED: &str =
        r#"{"status":"0","message":"NOTOK","result":"Contract source code already verified"}"#;

    /// Canned Etherscan API answering one request per connection.
    struct FakeExplorer {
        submit: &'static str,
        statuses: Mutex<VecDeque<&'static str>>,
        submits: AtomicUsize,
        status_checks: AtomicUsize,
    }

    impl FakeExplorer {
        fn new(submit: &'static str, statuses: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                submit,
                statuses: Mutex::new(statuses.iter().copied().collect()),
                submits: AtomicUsize::new(0),
                status_checks: AtomicUsize::new(0),
            })
        }

        /// Serve on an ephemeral local port and return the API URL.
        async fn serve(self: &Arc<Self>) -> Url {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = Url::parse(&format!("http://{}/api", listener.local_addr().unwrap())).unwrap();

            let explorer = Arc::clone(self);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let explorer = Arc::clone(&explorer);
                    tokio::spawn(async move { explorer.handle(stream).await });
                }
            });
            url
        }

        async fn handle(&self, mut stream: TcpStream) {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            // Status checks are GET requests carrying the action in the query string.
            let body = if head.contains("checkverifystatus") {
                self.status_checks.fetch_add(1, Ordering::SeqCst);
                self.statuses.lock().unwrap().pop_front().unwrap_or(PENDING)
            } else {
                self.submits.fetch_add(1, Ordering::SeqCst);
                self.submit
            };

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }

        fn status_checks(&self) -> usize {
            self.status_checks.load(Ordering::SeqCst)
        }
    }

    /// Verify the sample artifact against `explorer`, polling without delay.
    async fn verify_against(
        explorer: &Arc<FakeExplorer>,
        attempts: usize,
    ) -> Result<VerificationOutcome> {
        let tmp = TempDir::new("revealkit-verify").unwrap();
        write_artifacts(tmp.path());

        let mut ctx = context(4);
        ctx.network.explorer_api_url = Some(explorer.serve().await);

        let verifier = EtherscanVerifier::new(Some("KEY".to_string()), ArtifactStore::new(tmp.path()))
            .unwrap()
            .with_status_polling(Duration::ZERO, attempts);
        let request = VerificationRequest {
            contract: "Sample".to_string(),
            address: Address::repeat_byte(0x05),
            constructor_args: vec![
                "RESTORE".to_string(),
                "8".to_string(),
                Address::repeat_byte(0x11).to_string(),
            ],
        };

        verifier.verify(&ctx, &request).await
    }

    #[tokio::test]
    async fn test_polls_until_verified() {
        let explorer = FakeExplorer::new(SUBMITTED, &[PENDING, PASS]);

        let outcome = verify_against(&explorer, STATUS_POLL_ATTEMPTS).await.unwrap();

        assert_eq!(outcome, VerificationOutcome::Verified);
        assert_eq!(explorer.submits.load(Ordering::SeqCst), 1);
        assert_eq!(explorer.status_checks(), 2);
    }

    #[tokio::test]
    async fn test_already_verified_at_submit() {
        let explorer = FakeExplorer::new(ALREADY_VERIFIED, &[]);

        let outcome = verify_against(&explorer, STATUS_POLL_ATTEMPTS).await.unwrap();

        assert_eq!(outcome, VerificationOutcome::AlreadyVerified);
        assert_eq!(explorer.status_checks(), 0);
    }

    #[tokio::test]
    async fn test_failed_status_stops_polling() {
        let explorer = FakeExplorer::new(SUBMITTED, &[FAIL, PASS]);

        let err = verify_against(&explorer, STATUS_POLL_ATTEMPTS)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Fail - Unable to verify"));
        assert_eq!(explorer.status_checks(), 1);
    }

    #[tokio::test]
    async fn test_status_checks_are_bounded() {
        let explorer = FakeExplorer::new(SUBMITTED, &[]);

        let err = verify_against(&explorer, 3).await.unwrap_err();

        assert!(err.to_string().contains("pending"));
        assert_eq!(explorer.status_checks(), 3);
    }
}
