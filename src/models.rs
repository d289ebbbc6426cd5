//! Data models and structures
//!
//! Defines the request-scoped values that flow through one pipeline
//! invocation (generation requests, attempt outcomes, stored artifacts)
//! plus the environment-backed configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Text,
    Image,
    Speech,
}

/// Optional knobs forwarded to the provider adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate_hz: Option<u32>,
}

/// One generation request. Immutable for the duration of an orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
    #[serde(default)]
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Text,
            prompt: prompt.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Image,
            prompt: prompt.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn speech(prompt: impl Into<String>) -> Self {
        Self {
            kind: GenerationKind::Speech,
            prompt: prompt.into(),
            params: GenerationParams::default(),
        }
    }
}

/// Raw bytes produced by a successful provider attempt.
///
/// Transport encoding (base64) is decoded at the adapter boundary; nothing
/// downstream ever sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Classification of a failed provider attempt.
///
/// The kind alone determines what the orchestrator does next; adapters
/// classify once, structurally, so no caller ever matches on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider throttled this credential (HTTP 429/503). Other credentials
    /// are still worth trying.
    RateLimited,
    /// The model does not exist for this provider account (HTTP 404).
    /// Shared across credentials, so the credential loop is abandoned.
    ModelUnavailable,
    /// Network-level failure (timeout, DNS, reset).
    Transient,
    /// Provider rejected the request or returned an unusable success body.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result of exactly one adapter call.
pub type AttemptOutcome = std::result::Result<GeneratedPayload, AttemptFailure>;

/// The final, published artifact of a successful invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub url: String,
    pub path: String,
    pub content_type: String,
    pub generated_at: DateTime<Utc>,
}

/// What to do when the optional record-store write fails (the generation
/// and upload themselves already succeeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryFailurePolicy {
    Propagate,
    #[default]
    LogAndContinue,
}

/// Row to update with the artifact URL after upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTarget {
    pub table: String,
    pub id: String,
    pub column: String,
}

/// One unit of work for the pipeline: what to generate, where to store it,
/// and which record (if any) to point at the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    #[serde(flatten)]
    pub request: GenerationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordTarget>,
    #[serde(default)]
    pub on_record_failure: SecondaryFailurePolicy,
}

impl GenerationJob {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            path: None,
            record: None,
            on_record_failure: SecondaryFailurePolicy::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_record(mut self, record: RecordTarget, policy: SecondaryFailurePolicy) -> Self {
        self.record = Some(record);
        self.on_record_failure = policy;
        self
    }

    /// Storage path for this job; callers that don't care get a fresh
    /// kind-prefixed UUID path.
    pub fn storage_path(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => {
                let (prefix, ext) = match self.request.kind {
                    GenerationKind::Text => ("textos", "txt"),
                    GenerationKind::Image => ("capas", "png"),
                    GenerationKind::Speech => ("narracoes", "wav"),
                };
                format!("{}/{}.{}", prefix, Uuid::new_v4(), ext)
            }
        }
    }
}

/// JSON envelope returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResponse {
    pub fn from_artifact(artifact: StoredArtifact) -> Self {
        Self {
            success: true,
            url: Some(artifact.url),
            path: Some(artifact.path),
            content_type: Some(artifact.content_type),
            generated_at: Some(artifact.generated_at),
            error: None,
        }
    }

    pub fn from_error(error: &crate::Error) -> Self {
        Self {
            success: false,
            url: None,
            path: None,
            content_type: None,
            generated_at: None,
            error: Some(error.to_string()),
        }
    }
}

const DEFAULT_TEXT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash"];
const DEFAULT_IMAGE_MODELS: &[&str] = &[
    "gemini-2.5-flash-image",
    "gemini-2.0-flash-preview-image-generation",
];
const DEFAULT_SPEECH_MODELS: &[&str] = &["gemini-2.5-flash-preview-tts"];

/// Blob-store connection settings.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    pub public_base_url: String,
}

/// Record-store connection settings (optional; jobs without a record target
/// never touch it).
#[derive(Debug, Clone)]
pub struct RecordConfig {
    pub base_url: String,
    pub api_key: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_keys: Vec<String>,
    pub tinify_api_key: Option<String>,
    pub text_models: Vec<String>,
    pub image_models: Vec<String>,
    pub speech_models: Vec<String>,
    pub blob: BlobConfig,
    pub record: Option<RecordConfig>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        // Keys are ordered by priority; unset or blank slots are skipped.
        let gemini_api_keys = ["GEMINI_API_KEY", "GEMINI_API_KEY_2", "GEMINI_API_KEY_3"]
            .iter()
            .filter_map(|name| non_empty_var(name))
            .collect();

        let record = match (
            non_empty_var("RECORD_STORE_URL"),
            non_empty_var("RECORD_STORE_KEY"),
        ) {
            (Some(base_url), Some(api_key)) => Some(RecordConfig { base_url, api_key }),
            _ => None,
        };

        Ok(Self {
            gemini_api_keys,
            tinify_api_key: non_empty_var("TINIFY_API_KEY"),
            text_models: model_list_var("TEXT_MODELS", DEFAULT_TEXT_MODELS),
            image_models: model_list_var("IMAGE_MODELS", DEFAULT_IMAGE_MODELS),
            speech_models: model_list_var("SPEECH_MODELS", DEFAULT_SPEECH_MODELS),
            blob: BlobConfig {
                access_key_id: require_var("BLOB_ACCESS_KEY_ID")?,
                secret_access_key: require_var("BLOB_SECRET_ACCESS_KEY")?,
                endpoint: std::env::var("BLOB_ENDPOINT")
                    .unwrap_or_else(|_| "https://nyc3.digitaloceanspaces.com".to_string()),
                bucket: std::env::var("BLOB_BUCKET").unwrap_or_else(|_| "juris-media".to_string()),
                public_base_url: std::env::var("BLOB_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "https://media.juris.example.com".to_string()),
            },
            record,
        })
    }
}

fn require_var(name: &str) -> crate::Result<String> {
    non_empty_var(name).ok_or_else(|| crate::Error::Config(format!("{} not set", name)))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn model_list_var(name: &str, defaults: &[&str]) -> Vec<String> {
    match non_empty_var(name) {
        Some(raw) => split_model_list(&raw),
        None => defaults.iter().map(|m| m.to_string()).collect(),
    }
}

/// Split a comma-separated model preference list, dropping blank entries.
pub fn split_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
