use super::client::GeminiHttpClient;
use super::types::{Content, Part};
use crate::models::{AttemptFailure, AttemptOutcome, FailureKind, GeneratedPayload, GenerationRequest};
use crate::provider::ProviderAdapter;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const TEXT_MIME: &str = "text/plain; charset=utf-8";

#[derive(Debug, Serialize)]
struct TextRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<TextGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

pub struct GeminiTextAdapter {
    http: GeminiHttpClient,
}

impl GeminiTextAdapter {
    pub fn new() -> Self {
        Self::new_with_client(reqwest::Client::new())
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(Duration::from_secs(30), client),
        }
    }
}

impl Default for GeminiTextAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiTextAdapter);

#[async_trait]
impl ProviderAdapter for GeminiTextAdapter {
    async fn attempt(
        &self,
        request: &GenerationRequest,
        credential: &str,
        model: &str,
    ) -> AttemptOutcome {
        let body = TextRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.params.temperature.map(|temperature| {
                TextGenerationConfig {
                    temperature: Some(temperature),
                }
            }),
        };

        let response = self.http.generate_content(credential, model, &body).await?;

        let text = response.first_text().ok_or_else(|| {
            AttemptFailure::new(FailureKind::Fatal, "no text in Gemini response")
        })?;

        Ok(GeneratedPayload {
            bytes: text.as_bytes().to_vec(),
            mime: TEXT_MIME.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::gemini::test_support;
    use wiremock::{MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash";

    fn make_adapter(server: &MockServer) -> GeminiTextAdapter {
        GeminiTextAdapter::new().with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_attempt_returns_utf8_bytes() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "O artigo trata da liberdade de expressão." }] }
                }]
            })))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let request = GenerationRequest::text("explique o art. 5º");

        let payload = adapter.attempt(&request, "key", MODEL).await.unwrap();
        assert_eq!(
            payload.bytes,
            "O artigo trata da liberdade de expressão.".as_bytes()
        );
        assert_eq!(payload.mime, TEXT_MIME);
    }

    #[tokio::test]
    async fn test_temperature_is_forwarded() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(wiremock::matchers::body_string_contains("\"temperature\":0.2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let mut request = GenerationRequest::text("resuma");
        request.params.temperature = Some(0.2);

        adapter.attempt(&request, "key", MODEL).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limit_is_classified() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let failure = adapter
            .attempt(&GenerationRequest::text("x"), "key", MODEL)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert!(failure.message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_text_is_fatal() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let failure = adapter
            .attempt(&GenerationRequest::text("x"), "key", MODEL)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Fatal);
    }
}
