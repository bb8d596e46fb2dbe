//! Shared HTTP plumbing for the remote collaborators (embeddings, LLM,
//! Supabase, routing, geocoding).
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! `max_retries = 0` sends exactly one request.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Build a client with the given timeout.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send the request produced by `build`, retrying transient failures.
///
/// `build` is called once per attempt because a `RequestBuilder` is
/// consumed by `send`. Returns the first successful response.
pub async fn send_with_retry<F>(label: &str, max_retries: u32, mut build: F) -> Result<reqwest::Response>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(label, attempt, ?delay, "retrying request");
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response);
                }

                // Rate limited or server error, retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    warn!(label, %status, "transient API error");
                    last_err = Some(anyhow::anyhow!("{} API error {}: {}", label, status, body_text));
                    continue;
                }

                // Client error (not 429), don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("{} API error {}: {}", label, status, body_text);
            }
            Err(e) => {
                warn!(label, error = %e, "request failed");
                last_err = Some(anyhow::anyhow!("{} connection error: {}", label, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", label)))
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/", "/a/b"), "http://h/a/b");
        assert_eq!(join_url("http://h", "a"), "http://h/a");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(5).unwrap();
        let url = join_url(&server.uri(), "bad");
        let err = send_with_retry("Test", 3, || client.get(&url))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn server_error_is_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client(5).unwrap();
        let url = join_url(&server.uri(), "flaky");
        let resp = send_with_retry("Test", 1, || client.get(&url)).await.unwrap();
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn zero_retries_sends_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(5).unwrap();
        let url = server.uri();
        assert!(send_with_retry("Test", 0, || client.get(&url)).await.is_err());
    }
}
