//! Low-level Gemini REST client shared by the text, image, and speech
//! adapters.
//!
//! This is the single place where provider responses are classified into
//! [`FailureKind`]s. Adapters upstream only look at the structured kind,
//! never at status codes or message text.

use super::types::{GenerateContentResponse, InlineData};
use crate::models::{AttemptFailure, FailureKind, GeneratedPayload};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Longest response-body excerpt carried in a Fatal failure message.
const BODY_EXCERPT_LEN: usize = 300;

pub struct GeminiHttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self::new_with_client(timeout, Client::new())
    }

    pub fn new_with_client(timeout: Duration, client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Calls Gemini's `generateContent` endpoint once with the given
    /// credential and model, classifying every outcome.
    pub async fn generate_content<Req: Serialize>(
        &self,
        credential: &str,
        model: &str,
        request: &Req,
    ) -> Result<GenerateContentResponse, AttemptFailure> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", credential)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Gemini request failed before a response: {}", e);
                AttemptFailure::new(FailureKind::Transient, e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!("Failed to read Gemini response body: {}", e);
            AttemptFailure::new(FailureKind::Transient, e.to_string())
        })?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Unparseable Gemini success response: {}", e);
            AttemptFailure::new(
                FailureKind::Fatal,
                format!("unparseable response: {} ({})", e, excerpt(&body)),
            )
        })
    }
}

fn classify_status(status: StatusCode, body: &str) -> AttemptFailure {
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => FailureKind::RateLimited,
        StatusCode::NOT_FOUND => FailureKind::ModelUnavailable,
        _ => FailureKind::Fatal,
    };
    tracing::warn!("Gemini API error (status {}): {}", status, excerpt(body));
    AttemptFailure::new(kind, format!("status {}: {}", status, excerpt(body)))
}

/// Decode a base64 inline part into raw bytes; downstream stages never see
/// the transport encoding.
pub fn decode_inline(inline: &InlineData) -> Result<GeneratedPayload, AttemptFailure> {
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&inline.data)
        .map_err(|e| {
            AttemptFailure::new(FailureKind::Fatal, format!("undecodable inline data: {}", e))
        })?;
    Ok(GeneratedPayload {
        bytes,
        mime: inline.mime_type.clone(),
    })
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit_statuses() {
        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::SERVICE_UNAVAILABLE] {
            let failure = classify_status(status, "throttled");
            assert_eq!(failure.kind, FailureKind::RateLimited);
        }
    }

    #[test]
    fn test_classify_missing_model() {
        let failure = classify_status(StatusCode::NOT_FOUND, "model not found");
        assert_eq!(failure.kind, FailureKind::ModelUnavailable);
    }

    #[test]
    fn test_classify_other_statuses_as_fatal() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let failure = classify_status(status, "nope");
            assert_eq!(failure.kind, FailureKind::Fatal);
        }
    }

    #[test]
    fn test_fatal_message_carries_truncated_body() {
        let long_body = "x".repeat(1000);
        let failure = classify_status(StatusCode::BAD_REQUEST, &long_body);
        assert!(failure.message.len() < 400);
        assert!(failure.message.ends_with("..."));
    }

    #[test]
    fn test_decode_inline_rejects_bad_base64() {
        let inline = InlineData {
            mime_type: "image/png".to_string(),
            data: "!!!not-base64!!!".to_string(),
        };
        let failure = decode_inline(&inline).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Fatal);
    }

    #[test]
    fn test_decode_inline_returns_raw_bytes() {
        use base64::Engine as _;
        let raw = vec![0x89, 0x50, 0x4E, 0x47];
        let inline = InlineData {
            mime_type: "image/png".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&raw),
        };
        let payload = decode_inline(&inline).unwrap();
        assert_eq!(payload.bytes, raw);
        assert_eq!(payload.mime, "image/png");
    }
}
