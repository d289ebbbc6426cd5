use super::ProviderAdapter;
use crate::models::{
    AttemptFailure, AttemptOutcome, FailureKind, GeneratedPayload, GenerationRequest,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted adapter for orchestrator and pipeline tests.
///
/// Outcomes are consumed in the order they were queued; once the script is
/// exhausted (or when none was given) every further attempt succeeds with a
/// small default payload. Each call is recorded as a `(model, credential)`
/// pair so tests can assert attempt ordering.
#[derive(Clone)]
pub struct MockAdapter {
    outcomes: Arc<Mutex<Vec<ScriptedOutcome>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
enum ScriptedOutcome {
    Success(GeneratedPayload),
    Failure(FailureKind, String),
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_success(self, bytes: Vec<u8>, mime: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(ScriptedOutcome::Success(GeneratedPayload {
                bytes,
                mime: mime.to_string(),
            }));
        self
    }

    pub fn with_failure(self, kind: FailureKind, message: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(ScriptedOutcome::Failure(kind, message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(model, credential)` pairs in the order they were attempted.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompts exactly as the adapter received them.
    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    async fn attempt(
        &self,
        request: &GenerationRequest,
        credential: &str,
        model: &str,
    ) -> AttemptOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), credential.to_string()));
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Ok(GeneratedPayload {
                bytes: vec![0x01, 0x02, 0x03],
                mime: "application/octet-stream".to_string(),
            });
        }

        match outcomes.remove(0) {
            ScriptedOutcome::Success(payload) => Ok(payload),
            ScriptedOutcome::Failure(kind, message) => Err(AttemptFailure::new(kind, message)),
        }
    }
}
