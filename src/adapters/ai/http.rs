//! HTTP plumbing shared by the provider adapters.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ports::AIError;

/// Seconds to wait when a 429 carries no hint.
const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Sends a JSON body and decodes a JSON reply.
pub(crate) async fn post_json<Req, Rep>(request: RequestBuilder, body: &Req) -> Result<Rep, AIError>
where
    Req: Serialize + ?Sized,
    Rep: DeserializeOwned,
{
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })?;

    let response = handle_response_status(response).await?;

    response
        .json()
        .await
        .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))
}

/// Maps non-success statuses onto [`AIError`].
pub(crate) async fn handle_response_status(response: Response) -> Result<Response, AIError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let header_retry = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u32>().ok());
    let error_body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => Err(AIError::AuthenticationFailed),
        429 => Err(AIError::rate_limited(
            header_retry.unwrap_or_else(|| parse_retry_after(&error_body)),
        )),
        400 | 413 => {
            if error_body.contains("maximum context length")
                || error_body.contains("context_length_exceeded")
                || error_body.contains("prompt is too long")
            {
                Err(AIError::ContextTooLong(error_body))
            } else {
                Err(AIError::InvalidRequest(error_body))
            }
        }
        500..=599 => Err(AIError::unavailable(format!(
            "Server error {}: {}",
            status, error_body
        ))),
        _ => Err(AIError::network(format!(
            "Unexpected status {}: {}",
            status, error_body
        ))),
    }
}

/// Looks for "try again in Ns" in a provider error message.
pub(crate) fn parse_retry_after(error_body: &str) -> u32 {
    let message = serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        });

    message
        .as_deref()
        .and_then(|s| s.find("try again in ").map(|idx| &s[idx + 13..]))
        .and_then(|rest| {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            rest[..end].parse::<u32>().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
