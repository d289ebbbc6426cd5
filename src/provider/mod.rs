//! Provider adapters for generation requests
//!
//! An adapter issues exactly one network call to one provider with one
//! credential and one model, and classifies the result into the uniform
//! [`AttemptOutcome`] sum type. Retrying is never done here; that is the
//! fallback orchestrator's job.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiImageAdapter, GeminiSpeechAdapter, GeminiTextAdapter};
pub use mock::MockAdapter;

use crate::models::{AttemptOutcome, GenerationRequest};
use async_trait::async_trait;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Issue one generation attempt. Exactly one outbound HTTP call.
    async fn attempt(
        &self,
        request: &GenerationRequest,
        credential: &str,
        model: &str,
    ) -> AttemptOutcome;
}
