use super::client::{decode_inline, GeminiHttpClient};
use super::types::{Content, Part};
use crate::models::{AttemptFailure, AttemptOutcome, FailureKind, GenerationRequest};
use crate::provider::ProviderAdapter;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Used when the request names no voice. Batch callers normally assign
/// voices through [`crate::app::VoiceRotation`] before reaching this point.
pub const DEFAULT_VOICE: &str = "Zephyr";

#[derive(Debug, Serialize)]
struct SpeechRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: SpeechGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

pub struct GeminiSpeechAdapter {
    http: GeminiHttpClient,
}

impl GeminiSpeechAdapter {
    pub fn new() -> Self {
        Self::new_with_client(reqwest::Client::new())
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(Duration::from_secs(120), client),
        }
    }
}

impl Default for GeminiSpeechAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiSpeechAdapter);

#[async_trait]
impl ProviderAdapter for GeminiSpeechAdapter {
    async fn attempt(
        &self,
        request: &GenerationRequest,
        credential: &str,
        model: &str,
    ) -> AttemptOutcome {
        let voice = request
            .params
            .voice
            .clone()
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());

        let body = SpeechRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: SpeechGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: voice },
                    },
                },
            },
        };

        let response = self.http.generate_content(credential, model, &body).await?;

        let inline = response.first_inline_data().ok_or_else(|| {
            AttemptFailure::new(FailureKind::Fatal, "no audio data in Gemini response")
        })?;

        tracing::debug!("Gemini returned audio with mime_type: {}", inline.mime_type);
        // Raw PCM at this point; the WAV wrapping happens in post-processing.
        decode_inline(inline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::gemini::test_support;
    use wiremock::{MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash-preview-tts";

    fn make_adapter(server: &MockServer) -> GeminiSpeechAdapter {
        GeminiSpeechAdapter::new().with_base_url(server.uri())
    }

    fn pcm_response(bytes: &[u8]) -> serde_json::Value {
        use base64::Engine as _;
        serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "mimeType": "audio/L16;codec=pcm;rate=24000",
                            "data": base64::engine::general_purpose::STANDARD.encode(bytes)
                        }
                    }]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_attempt_decodes_pcm() {
        let server = MockServer::start().await;
        let pcm = vec![0x00, 0x01, 0x02, 0x03];

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(pcm_response(&pcm)))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let payload = adapter
            .attempt(&GenerationRequest::speech("artigo quinto"), "key", MODEL)
            .await
            .unwrap();
        assert_eq!(payload.bytes, pcm);
        assert_eq!(payload.mime, "audio/L16;codec=pcm;rate=24000");
    }

    #[tokio::test]
    async fn test_requested_voice_is_forwarded() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(wiremock::matchers::body_string_contains(
                "\"voiceName\":\"Aoede\"",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(pcm_response(&[0x00])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let mut request = GenerationRequest::speech("texto");
        request.params.voice = Some("Aoede".to_string());

        adapter.attempt(&request, "key", MODEL).await.unwrap();
    }

    #[tokio::test]
    async fn test_falls_back_to_default_voice() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(wiremock::matchers::body_string_contains(DEFAULT_VOICE))
            .respond_with(ResponseTemplate::new(200).set_body_json(pcm_response(&[0x00])))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        adapter
            .attempt(&GenerationRequest::speech("texto"), "key", MODEL)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_overloaded_backend_is_rate_limited() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server);
        let failure = adapter
            .attempt(&GenerationRequest::speech("texto"), "key", MODEL)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::RateLimited);
    }
}
