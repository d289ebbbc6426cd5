//! Generation pipeline for juris study content
//!
//! Generates AI text, cover images, and narrated audio for a legal-study
//! platform, with multi-key/multi-model fallback, optional post-processing
//! (image compression, WAV wrapping), and publishing to a public blob store
//! plus an optional record-store write-back.

pub mod app;
pub mod credentials;
pub mod error;
pub mod models;
pub mod narration;
pub mod orchestrator;
pub mod postprocess;
pub mod provider;
pub mod storage;

pub use error::{Error, Result};
