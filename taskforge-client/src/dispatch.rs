//! HTTP dispatch with retry and exponential backoff.
//!
//! Transient failures (network errors and 5xx responses) are retried with
//! jittered exponential delays; everything else propagates immediately.
//! Retry state lives on this function's stack for exactly one call.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, trace, warn};

use taskforge_core::{Error, Result};

/// Retry tuning, snapshotted out of the client config.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub delay_factor: Duration,
    pub randomization_factor: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): exponential in the
    /// retry count, jittered, capped.
    fn backoff(&self, retry: u32) -> Duration {
        let exponential =
            self.delay_factor.as_secs_f64() * f64::from(2u32.saturating_pow(retry - 1));
        let jitter = if self.randomization_factor > 0.0 {
            rand::rng().random_range(-self.randomization_factor..=self.randomization_factor)
        } else {
            0.0
        };
        let delay = exponential * (1.0 + jitter);
        Duration::from_secs_f64(delay.max(0.0)).min(self.max_delay)
    }
}

/// Error text for a non-2xx response: the server's `{message}` field when
/// the body parses, otherwise the raw body, otherwise the status itself.
fn error_message(status: reqwest::StatusCode, body: &Value, text: &str) -> String {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        return message.to_owned();
    }
    if !text.trim().is_empty() {
        return text.trim().to_owned();
    }
    format!("request failed with status {}", status)
}

/// Issue one HTTP request, retrying transient failures.
///
/// Returns the decoded JSON body on 2xx; an empty body is empty-object
/// success.
pub(crate) async fn dispatch(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<String>,
    auth_header: Option<String>,
    policy: &RetryPolicy,
) -> Result<Value> {
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            warn!(url, attempt, ?delay, "retrying after transient failure");
            tokio::time::sleep(delay).await;
        }

        let mut request = http.request(method.clone(), url);
        if let Some(body) = &body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        if let Some(auth) = &auth_header {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        trace!(%method, url, attempt, "sending request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "request failed at the network level");
                last_error = Some(Error::connection(format!("{} {}: {}", method, url, e)));
                continue;
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(url, error = %e, "failed reading response body");
                last_error = Some(Error::connection(format!("{} {}: {}", method, url, e)));
                continue;
            }
        };

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Object(serde_json::Map::new()));
            }
            return serde_json::from_str(&text)
                .map_err(|e| Error::failure(format!("response from {} is not JSON: {}", url, e)));
        }

        let body_json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let error = Error::rest(error_message(status, &body_json, &text), status.as_u16(), body_json);

        if status.is_server_error() {
            last_error = Some(error);
            continue;
        }
        // 4xx (and stray 3xx after redirect handling): not transient.
        return Err(error);
    }

    Err(last_error
        .unwrap_or_else(|| Error::connection(format!("{} {}: retries exhausted", method, url))))
}
