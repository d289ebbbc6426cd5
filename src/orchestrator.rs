//! Fallback orchestration over models and credentials.
//!
//! One orchestration walks two nested, strictly sequential loops: models in
//! preference order on the outside, credentials in priority order on the
//! inside. The first success short-circuits everything. A `ModelUnavailable`
//! failure abandons the remaining credentials for that model (the model is
//! missing for the whole provider account family, so further attempts would
//! only repeat the same 404). Every other failure kind moves on to the next
//! credential. No (model, credential) pair is ever attempted twice, so the
//! total number of adapter calls is bounded by |models| x |credentials|.
//!
//! The orchestrator carries no timeout of its own; callers that need an
//! overall deadline wrap the `run` future.

use crate::credentials::CredentialPool;
use crate::models::{AttemptFailure, FailureKind, GeneratedPayload, GenerationRequest};
use crate::provider::ProviderAdapter;
use crate::{Error, Result};
use tracing::{debug, info, warn};

pub struct FallbackOrchestrator {
    models: Vec<String>,
}

impl FallbackOrchestrator {
    /// `models` is the preference order; index 0 is tried first.
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn run(
        &self,
        adapter: &dyn ProviderAdapter,
        pool: &CredentialPool,
        request: &GenerationRequest,
    ) -> Result<GeneratedPayload> {
        if self.models.is_empty() {
            return Err(Error::Config("empty model preference list".to_string()));
        }

        let mut last_failure: Option<AttemptFailure> = None;

        for model in &self.models {
            for (slot, credential) in pool.iter().enumerate() {
                debug!("Attempting model {} with credential #{}", model, slot + 1);

                match adapter.attempt(request, credential, model).await {
                    Ok(payload) => {
                        info!(
                            "Generation succeeded on model {} with credential #{} ({} bytes, {})",
                            model,
                            slot + 1,
                            payload.bytes.len(),
                            payload.mime
                        );
                        return Ok(payload);
                    }
                    Err(failure) => {
                        warn!(
                            "Attempt failed on model {} with credential #{}: {:?}: {}",
                            model,
                            slot + 1,
                            failure.kind,
                            failure.message
                        );
                        let kind = failure.kind;
                        last_failure = Some(failure);

                        if kind == FailureKind::ModelUnavailable {
                            // Shared across credentials; skip straight to the
                            // next model.
                            break;
                        }
                        // RateLimited and Transient are per-credential.
                        // Fatal is also retried across credentials: a
                        // rejection on one account does not prove the model
                        // itself is broken.
                    }
                }
            }
        }

        let message = match last_failure {
            Some(failure) => failure.message,
            None => "no attempts were made".to_string(),
        };
        Err(Error::AllProvidersExhausted(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAdapter;

    fn pool(keys: &[&str]) -> CredentialPool {
        CredentialPool::new("gemini", keys.iter().map(|k| k.to_string())).unwrap()
    }

    fn orchestrator(models: &[&str]) -> FallbackOrchestrator {
        FallbackOrchestrator::new(models.iter().map(|m| m.to_string()).collect())
    }

    #[tokio::test]
    async fn test_first_pair_success_makes_exactly_one_call() {
        let adapter = MockAdapter::new().with_success(vec![0xCA, 0xFE], "image/png");
        let request = GenerationRequest::image("capa");

        let payload = orchestrator(&["m1", "m2"])
            .run(&adapter, &pool(&["k1", "k2", "k3"]), &request)
            .await
            .unwrap();

        assert_eq!(payload.bytes, vec![0xCA, 0xFE]);
        assert_eq!(adapter.get_call_count(), 1);
        assert_eq!(adapter.get_calls()[0], ("m1".to_string(), "k1".to_string()));
    }

    #[tokio::test]
    async fn test_rate_limits_rotate_credentials_within_model() {
        // Scenario A: credentials 1 and 2 are throttled on m1, 3 succeeds.
        let adapter = MockAdapter::new()
            .with_failure(FailureKind::RateLimited, "throttled")
            .with_failure(FailureKind::RateLimited, "throttled")
            .with_success(vec![0x01], "image/png");
        let request = GenerationRequest::image("capa");

        let payload = orchestrator(&["m1", "m2"])
            .run(&adapter, &pool(&["k1", "k2", "k3"]), &request)
            .await
            .unwrap();

        assert_eq!(payload.bytes, vec![0x01]);
        assert_eq!(
            adapter.get_calls(),
            vec![
                ("m1".to_string(), "k1".to_string()),
                ("m1".to_string(), "k2".to_string()),
                ("m1".to_string(), "k3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_model_unavailable_skips_remaining_credentials() {
        // Scenario B: m1 is missing, so only one call is made for it.
        let adapter = MockAdapter::new()
            .with_failure(FailureKind::ModelUnavailable, "not found")
            .with_success(vec![0x02], "image/png");
        let request = GenerationRequest::image("capa");

        let payload = orchestrator(&["m1", "m2"])
            .run(&adapter, &pool(&["k1", "k2"]), &request)
            .await
            .unwrap();

        assert_eq!(payload.bytes, vec![0x02]);
        assert_eq!(
            adapter.get_calls(),
            vec![
                ("m1".to_string(), "k1".to_string()),
                ("m2".to_string(), "k1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_still_rotates_credentials() {
        let adapter = MockAdapter::new()
            .with_failure(FailureKind::Fatal, "rejected")
            .with_success(vec![0x03], "text/plain");
        let request = GenerationRequest::text("resumo");

        let payload = orchestrator(&["m1"])
            .run(&adapter, &pool(&["k1", "k2"]), &request)
            .await
            .unwrap();

        assert_eq!(payload.bytes, vec![0x03]);
        assert_eq!(adapter.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_full_exhaustion_visits_every_pair_once() {
        // Scenario C: every pair fails; |models| x |credentials| calls.
        let mut adapter = MockAdapter::new();
        for i in 0..6 {
            adapter = adapter.with_failure(FailureKind::Transient, &format!("timeout {}", i));
        }
        let request = GenerationRequest::text("resumo");

        let err = orchestrator(&["m1", "m2"])
            .run(&adapter, &pool(&["k1", "k2", "k3"]), &request)
            .await
            .unwrap_err();

        assert_eq!(adapter.get_call_count(), 6);
        match err {
            Error::AllProvidersExhausted(message) => {
                // The surfaced message references the last observed failure.
                assert!(message.contains("timeout 5"));
            }
            other => panic!("unexpected error: {}", other),
        }

        let calls = adapter.get_calls();
        let mut unique = calls.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), calls.len());
    }

    #[tokio::test]
    async fn test_all_models_unavailable_makes_one_call_per_model() {
        let adapter = MockAdapter::new()
            .with_failure(FailureKind::ModelUnavailable, "no m1")
            .with_failure(FailureKind::ModelUnavailable, "no m2");
        let request = GenerationRequest::speech("texto");

        let err = orchestrator(&["m1", "m2"])
            .run(&adapter, &pool(&["k1", "k2", "k3"]), &request)
            .await
            .unwrap_err();

        assert_eq!(adapter.get_call_count(), 2);
        assert!(matches!(err, Error::AllProvidersExhausted(_)));
    }

    #[tokio::test]
    async fn test_empty_model_list_is_a_configuration_error() {
        let adapter = MockAdapter::new();
        let request = GenerationRequest::text("x");

        let err = orchestrator(&[])
            .run(&adapter, &pool(&["k1"]), &request)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(adapter.get_call_count(), 0);
    }
}
