//! Post-processing of generated payloads before upload
//!
//! Post-processing is a quality-of-service enhancement, never a correctness
//! requirement: every processor degrades to handing back the input unchanged
//! when it cannot (or should not) act. That makes the trait infallible by
//! contract.

pub mod tinify;
pub mod wav;

pub use tinify::TinifyCompressor;
pub use wav::WavEncoder;

use async_trait::async_trait;

#[async_trait]
pub trait PostProcessor: Send + Sync {
    /// Transform a payload, returning the (possibly unchanged) bytes and
    /// their content type.
    async fn process(&self, bytes: Vec<u8>, mime: &str) -> (Vec<u8>, String);
}

/// Identity processor used for payloads that need no transformation.
pub struct Passthrough;

#[async_trait]
impl PostProcessor for Passthrough {
    async fn process(&self, bytes: Vec<u8>, mime: &str) -> (Vec<u8>, String) {
        (bytes, mime.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_is_byte_for_byte() {
        let input = vec![0x01, 0x02, 0x03];
        let (bytes, mime) = Passthrough.process(input.clone(), "text/plain").await;
        assert_eq!(bytes, input);
        assert_eq!(mime, "text/plain");
    }
}
