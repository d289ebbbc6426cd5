//! Error handling and custom error types
//!
//! Provides unified error handling across the pipeline using thiserror.
//! Retryable attempt failures (rate limits, missing models, transport
//! hiccups) are deliberately *not* variants here: they live in
//! [`crate::models::AttemptFailure`] and are consumed inside the fallback
//! orchestrator. Everything in this enum is terminal for one invocation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no credentials configured for provider '{0}'")]
    NoCredentialsConfigured(String),

    #[error("all providers exhausted: {0}")]
    AllProvidersExhausted(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("record update failed: {0}")]
    RecordUpdateFailed(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
