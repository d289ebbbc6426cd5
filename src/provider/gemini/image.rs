use super::client::{decode_inline, GeminiHttpClient};
use super::types::{Content, Part};
use crate::models::{AttemptFailure, AttemptOutcome, FailureKind, GenerationRequest};
use crate::provider::ProviderAdapter;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
}

pub struct GeminiImageAdapter {
    http: GeminiHttpClient,
}

impl GeminiImageAdapter {
    pub fn new() -> Self {
        Self::new_with_client(reqwest::Client::new())
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        // Image generation is the slowest endpoint; give it headroom.
        Self {
            http: GeminiHttpClient::new_with_client(Duration::from_secs(120), client),
        }
    }
}

impl Default for GeminiImageAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiImageAdapter);

#[async_trait]
impl ProviderAdapter for GeminiImageAdapter {
    async fn attempt(
        &self,
        request: &GenerationRequest,
        credential: &str,
        model: &str,
    ) -> AttemptOutcome {
        let body = ImageRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        };

        let response = self.http.generate_content(credential, model, &body).await?;

        let inline = response.first_inline_data().ok_or_else(|| {
            AttemptFailure::new(FailureKind::Fatal, "no image data in Gemini response")
        })?;

        tracing::debug!("Gemini returned image with mime_type: {}", inline.mime_type);
        decode_inline(inline)
    }
}
