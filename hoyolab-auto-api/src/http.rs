//! Shared HTTP plumbing for the HoYoLAB clients.
//!
//! One flow for every gateway: send, log, classify transport failures, retry
//! transients with exponential backoff. Business retcodes inside a 200 body
//! are never retried here; the callers decide what a non-zero envelope means.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};

/// Build the shared `reqwest` client with the configured timeouts.
pub(crate) fn build_client(cfg: &ApiConfig) -> Client {
    Client::builder()
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.timeout())
        .build()
        .expect("Failed to create HTTP client")
}

/// Send a request and return the response body as text.
pub(crate) async fn execute(builder: RequestBuilder, endpoint: &str) -> Result<String> {
    log::debug!("[{endpoint}] request");

    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            }
        } else {
            ApiError::Network {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    let status = response.status().as_u16();
    log::debug!("[{endpoint}] status {status}");

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        return Err(ApiError::RateLimited {
            endpoint: endpoint.to_string(),
            retry_after,
        });
    }

    if matches!(status, 500..=599) {
        return Err(ApiError::Network {
            endpoint: endpoint.to_string(),
            detail: format!("HTTP {status}"),
        });
    }

    response.text().await.map_err(|e| ApiError::Network {
        endpoint: endpoint.to_string(),
        detail: format!("failed to read response body: {e}"),
    })
}

/// Send a request with retries on transient failures.
///
/// Backoff: 100ms, 200ms, 400ms, ... capped at 10s; a `Retry-After` hint wins
/// when present (capped at 30s). Business errors pass through untouched.
pub(crate) async fn execute_with_retry(
    builder: RequestBuilder,
    endpoint: &str,
    max_retries: u32,
) -> Result<String> {
    let mut last_error = None;

    for attempt in 0..=max_retries {
        let Some(req) = builder.try_clone() else {
            // Streaming bodies cannot be cloned; fall back to a single shot.
            log::warn!("[{endpoint}] request not clonable, retry disabled");
            return execute(builder, endpoint).await;
        };

        match execute(req, endpoint).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                let delay = retry_delay(&e, attempt);
                log::warn!(
                    "[{}] attempt {}/{} failed, retrying in {:.1}s: {}",
                    endpoint,
                    attempt + 1,
                    max_retries,
                    delay.as_secs_f32(),
                    e
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| ApiError::Network {
        endpoint: endpoint.to_string(),
        detail: "all retries exhausted with no error captured".to_string(),
    }))
}

/// Parse a JSON body, logging the raw text on failure.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, endpoint: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        log::error!("[{endpoint}] JSON parse failed: {e}");
        log::error!("[{endpoint}] raw response: {}", truncate_for_log(body));
        ApiError::Parse {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        }
    })
}

fn retry_delay(error: &ApiError, attempt: u32) -> Duration {
    if let ApiError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}

const LOG_BODY_LIMIT: usize = 512;

fn truncate_for_log(body: &str) -> String {
    if body.len() <= LOG_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = LOG_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(7), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(63), Duration::from_millis(10_000));
    }

    #[test]
    fn retry_after_hint_wins() {
        let e = ApiError::RateLimited {
            endpoint: "t".into(),
            retry_after: Some(7),
        };
        assert_eq!(retry_delay(&e, 0), Duration::from_secs(7));
    }

    #[test]
    fn retry_after_hint_capped() {
        let e = ApiError::RateLimited {
            endpoint: "t".into(),
            retry_after: Some(600),
        };
        assert_eq!(retry_delay(&e, 0), Duration::from_secs(30));
    }

    #[test]
    fn parse_json_valid() {
        #[derive(serde::Deserialize)]
        struct Foo {
            x: i32,
        }
        let foo: Foo = parse_json(r#"{"x":42}"#, "test").unwrap();
        assert_eq!(foo.x, 42);
    }

    #[test]
    fn parse_json_invalid() {
        let result: Result<serde_json::Value> = parse_json("not json", "test");
        assert!(matches!(result, Err(ApiError::Parse { .. })));
    }

    #[test]
    fn truncation_keeps_short_bodies() {
        assert_eq!(truncate_for_log("short"), "short");
        let long = "x".repeat(2000);
        assert!(truncate_for_log(&long).contains("2000 bytes"));
    }
}
