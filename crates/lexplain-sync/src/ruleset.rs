//! HTTP client for pulling versioned scoring rulesets.
//!
//! Transient failures are retried with a fixed budget (at most 2 retries,
//! exponential backoff); after that the caller degrades to the last-known-
//! good local ruleset instead of failing the request path.

use std::time::Duration;

use lexplain_core::Ruleset;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("fetched ruleset is invalid: {0}")]
    Config(#[from] lexplain_core::ConfigError),
}

impl SyncError {
    /// Whether retrying could plausibly help: network failures and server
    /// 5xx responses are transient, a malformed or rejected ruleset is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Config(_) => false,
        }
    }
}

/// Retry budget: at most `max_retries` re-attempts with exponential
/// backoff starting at `base_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before re-attempt `attempt` (0-based): base × 2^attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// HTTP client for a remote ruleset endpoint.
pub struct RulesetClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RulesetClient {
    /// Create a client for the given base URL (no trailing slash needed).
    ///
    /// Every request is bounded by `timeout`; nothing in the engine blocks
    /// on this client without it.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch and validate the latest ruleset, once.
    pub async fn fetch_ruleset(&self) -> Result<Ruleset, SyncError> {
        let url = format!("{}/api/ruleset/latest", self.base_url);
        info!(url = %url, "fetching ruleset");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let ruleset: Ruleset = resp.json().await?;
        ruleset.validate()?;
        info!(version = %ruleset.version, "fetched ruleset");
        Ok(ruleset)
    }

    /// Fetch with the bounded retry budget.
    pub async fn fetch_with_retry(&self) -> Result<Ruleset, SyncError> {
        let mut attempt = 0;
        loop {
            match self.fetch_ruleset().await {
                Ok(ruleset) => return Ok(ruleset),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err,
                        "ruleset fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Fetch with retry, degrading to the given local ruleset on failure.
    ///
    /// Degradation is logged, not surfaced: a sync outage must never fail
    /// the caller's request path.
    pub async fn sync_or_local(&self, local: Ruleset) -> Ruleset {
        match self.fetch_with_retry().await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(error = %err, version = %local.version,
                    "ruleset sync failed, degrading to local ruleset");
                local
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client =
            RulesetClient::new("http://localhost:4000/".into(), Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://localhost:4000");
    }

    #[test]
    fn backoff_schedule_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
    }

    #[test]
    fn server_errors_split_transient_from_permanent() {
        let transient = SyncError::Server {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(transient.is_transient());

        let permanent = SyncError::Server {
            status: 404,
            body: "not found".into(),
        };
        assert!(!permanent.is_transient());
    }

    #[test]
    fn invalid_ruleset_is_not_retried() {
        let err = SyncError::Config(lexplain_core::ConfigError::invalid(
            "ruleset.version",
            "must not be empty",
        ));
        assert!(!err.is_transient());
    }

    #[test]
    fn ruleset_json_roundtrip() {
        let ruleset = Ruleset::default();
        let json = serde_json::to_string(&ruleset).unwrap();
        let parsed: Ruleset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, "builtin-1");
        assert_eq!(parsed.weights, ruleset.weights);
        assert_eq!(parsed.phrases, ruleset.phrases);
        parsed.validate().unwrap();
    }

    #[test]
    fn ruleset_json_rejects_nothing_silently() {
        // A wire ruleset with a bad synonym strength parses but fails
        // validation, so it can never be installed.
        let json = r#"{
            "version": "remote-1",
            "phrases": {
                "penalty": {
                    "canonical": ["penalty"],
                    "synonyms": [{"phrase": "overcharge", "strength": 0.95}]
                }
            }
        }"#;
        let parsed: Ruleset = serde_json::from_str(json).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[tokio::test]
    async fn sync_degrades_to_local_when_unreachable() {
        let client = RulesetClient::new(
            "http://127.0.0.1:9".into(),
            Duration::from_millis(200),
        )
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
        });

        let local = Ruleset::default();
        let resolved = client.sync_or_local(local.clone()).await;
        assert_eq!(resolved.version, local.version);
    }
}
