//! Pipeline wiring: orchestration, post-processing, and publishing.

use crate::credentials::CredentialPool;
use crate::models::{
    Config, GeneratedPayload, GenerationJob, GenerationKind, SecondaryFailurePolicy,
    StoredArtifact,
};
use crate::narration::prepare_narration;
use crate::orchestrator::FallbackOrchestrator;
use crate::postprocess::{wav, PostProcessor, TinifyCompressor, WavEncoder};
use crate::provider::{
    GeminiImageAdapter, GeminiSpeechAdapter, GeminiTextAdapter, ProviderAdapter,
};
use crate::storage::{BlobStoreClient, RecordStore, RestRecordClient, StorageSink};
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Voices rotated across the speech jobs of one batch.
pub const NARRATION_VOICES: &[&str] = &["Zephyr", "Aoede", "Kore", "Puck"];

/// Model preference lists per generation kind; index 0 is tried first.
#[derive(Debug, Clone)]
pub struct ModelPreferences {
    pub text: Vec<String>,
    pub image: Vec<String>,
    pub speech: Vec<String>,
}

/// Injectable service bundle used to construct [`Pipeline`] in
/// tests/harnesses.
pub struct PipelineServices {
    pub text: Box<dyn ProviderAdapter>,
    pub image: Box<dyn ProviderAdapter>,
    pub speech: Box<dyn ProviderAdapter>,
    pub image_post: Box<dyn PostProcessor>,
    pub speech_post: Box<dyn PostProcessor>,
    pub storage: Box<dyn StorageSink>,
    pub records: Option<Box<dyn RecordStore>>,
}

/// Runs one generation job end to end: fallback orchestration, optional
/// post-processing, upload, and the optional record update.
pub struct Pipeline {
    text: Box<dyn ProviderAdapter>,
    image: Box<dyn ProviderAdapter>,
    speech: Box<dyn ProviderAdapter>,
    image_post: Box<dyn PostProcessor>,
    speech_post: Box<dyn PostProcessor>,
    storage: Box<dyn StorageSink>,
    records: Option<Box<dyn RecordStore>>,
    credentials: CredentialPool,
    text_orchestrator: FallbackOrchestrator,
    image_orchestrator: FallbackOrchestrator,
    speech_orchestrator: FallbackOrchestrator,
}

impl Pipeline {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(
        services: PipelineServices,
        credentials: CredentialPool,
        models: ModelPreferences,
    ) -> Self {
        Self {
            text: services.text,
            image: services.image,
            speech: services.speech,
            image_post: services.image_post,
            speech_post: services.speech_post,
            storage: services.storage,
            records: services.records,
            credentials,
            text_orchestrator: FallbackOrchestrator::new(models.text),
            image_orchestrator: FallbackOrchestrator::new(models.image),
            speech_orchestrator: FallbackOrchestrator::new(models.speech),
        }
    }

    /// Construct a pipeline from environment configuration
    /// (`Config::from_env`).
    pub async fn new(config: Config) -> Result<Self> {
        let credentials = CredentialPool::new("gemini", config.gemini_api_keys.clone())?;
        info!(
            "Credential pool loaded with {} key(s)",
            credentials.len()
        );

        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let storage: Box<dyn StorageSink> = Box::new(BlobStoreClient::new(&config.blob).await?);
        let records: Option<Box<dyn RecordStore>> = match &config.record {
            Some(record_config) => Some(Box::new(RestRecordClient::new_with_client(
                record_config,
                http_client.clone(),
            ))),
            None => {
                info!("Record store not configured; jobs with record targets will not be written back");
                None
            }
        };

        let services = PipelineServices {
            text: Box::new(GeminiTextAdapter::new_with_client(http_client.clone())),
            image: Box::new(GeminiImageAdapter::new_with_client(http_client.clone())),
            speech: Box::new(GeminiSpeechAdapter::new_with_client(http_client.clone())),
            image_post: Box::new(TinifyCompressor::new_with_client(
                config.tinify_api_key.clone(),
                http_client,
            )),
            speech_post: Box::new(WavEncoder),
            storage,
            records,
        };

        Ok(Self::with_services(
            services,
            credentials,
            ModelPreferences {
                text: config.text_models,
                image: config.image_models,
                speech: config.speech_models,
            },
        ))
    }

    /// Run one job to completion. Any error returned here is terminal for
    /// the job; no partial artifact is kept.
    pub async fn run(&self, job: &GenerationJob) -> Result<StoredArtifact> {
        let mut request = job.request.clone();
        if request.kind == GenerationKind::Speech {
            request.prompt = prepare_narration(&request.prompt);
        }

        let (adapter, orchestrator) = match request.kind {
            GenerationKind::Text => (&self.text, &self.text_orchestrator),
            GenerationKind::Image => (&self.image, &self.image_orchestrator),
            GenerationKind::Speech => (&self.speech, &self.speech_orchestrator),
        };

        let mut payload = orchestrator
            .run(adapter.as_ref(), &self.credentials, &request)
            .await?;
        annotate_sample_rate(&mut payload, &request);

        let (bytes, content_type) = match request.kind {
            GenerationKind::Text => (payload.bytes, payload.mime),
            GenerationKind::Image => self.image_post.process(payload.bytes, &payload.mime).await,
            GenerationKind::Speech => self.speech_post.process(payload.bytes, &payload.mime).await,
        };

        let path = job.storage_path();
        let url = self.storage.store(&path, &bytes, &content_type).await?;
        info!("Stored artifact at {} ({} bytes)", url, bytes.len());

        if let Some(target) = &job.record {
            let outcome = match &self.records {
                Some(records) => {
                    records
                        .set_url(&target.table, &target.id, &target.column, &url)
                        .await
                }
                None => Err(Error::RecordUpdateFailed(format!(
                    "{}[{}]: record store not configured",
                    target.table, target.id
                ))),
            };

            if let Err(e) = outcome {
                match job.on_record_failure {
                    SecondaryFailurePolicy::Propagate => return Err(e),
                    SecondaryFailurePolicy::LogAndContinue => {
                        warn!("Record update skipped: {}", e);
                    }
                }
            }
        }

        Ok(StoredArtifact {
            url,
            path,
            content_type,
            generated_at: Utc::now(),
        })
    }

    /// Run independent jobs with fixed fan-out and a fixed delay between
    /// dispatch waves. Each job writes its own path, so waves share nothing;
    /// results come back in input order, one per job.
    pub async fn run_batch(
        self: Arc<Self>,
        mut jobs: Vec<GenerationJob>,
        fan_out: usize,
        delay: Duration,
    ) -> Vec<Result<StoredArtifact>> {
        let mut voices = VoiceRotation::new();
        for job in &mut jobs {
            voices.assign(job);
        }

        let fan_out = fan_out.max(1);
        let total = jobs.len();
        let mut results: Vec<Option<Result<StoredArtifact>>> = Vec::new();
        results.resize_with(total, || None);

        let indexed: Vec<(usize, GenerationJob)> = jobs.into_iter().enumerate().collect();
        for (wave, chunk) in indexed.chunks(fan_out).enumerate() {
            if wave > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let handles: Vec<(usize, tokio::task::JoinHandle<Result<StoredArtifact>>)> = chunk
                .iter()
                .cloned()
                .map(|(index, job)| {
                    let pipeline = Arc::clone(&self);
                    (index, tokio::spawn(async move { pipeline.run(&job).await }))
                })
                .collect();

            for (index, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(Error::Invariant(format!("batch task join error: {}", e))),
                };
                results[index] = Some(result);
            }
        }

        results
            .into_iter()
            .map(|slot| slot.expect("every batch slot is filled"))
            .collect()
    }
}

fn annotate_sample_rate(payload: &mut GeneratedPayload, request: &crate::models::GenerationRequest) {
    // A caller-supplied sample rate fills in for a PCM mime hint that
    // omitted one; an explicit hint from the provider wins.
    if request.kind != GenerationKind::Speech {
        return;
    }
    if let Some(rate) = request.params.sample_rate_hz {
        if payload.mime.starts_with("audio/L16") && wav::parse_sample_rate(&payload.mime).is_none()
        {
            payload.mime = format!("{};rate={}", payload.mime, rate);
        }
    }
}

/// Round-robin voice assignment, scoped to one batch.
///
/// Jobs that name a voice keep it; the rotation only fills gaps, so two
/// batches never influence each other.
pub struct VoiceRotation {
    voices: Vec<String>,
    next: usize,
}

impl VoiceRotation {
    pub fn new() -> Self {
        Self::with_voices(NARRATION_VOICES.iter().map(|v| v.to_string()).collect())
    }

    pub fn with_voices(voices: Vec<String>) -> Self {
        Self { voices, next: 0 }
    }

    pub fn assign(&mut self, job: &mut GenerationJob) {
        if job.request.kind != GenerationKind::Speech || self.voices.is_empty() {
            return;
        }
        if job.request.params.voice.is_none() {
            job.request.params.voice = Some(self.voices[self.next % self.voices.len()].clone());
            self.next += 1;
        }
    }
}

impl Default for VoiceRotation {
    fn default() -> Self {
        Self::new()
    }
}
