//! Remote image recompression via the Tinify API.
//!
//! Two-step protocol: upload the raster to `/shrink`, then ask the returned
//! output location for a fixed-dimension cover resize. An unconfigured key
//! or any network/API failure degrades to passing the original bytes through
//! unchanged; the pipeline never fails because compression was unavailable.

use super::PostProcessor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.tinify.com";
const COVER_WIDTH: u32 = 600;
const COVER_HEIGHT: u32 = 600;

#[derive(Debug, Serialize)]
struct ResizeRequest {
    resize: ResizeSpec,
}

#[derive(Debug, Serialize)]
struct ResizeSpec {
    method: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: ShrinkOutput,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    url: String,
}

pub struct TinifyCompressor {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TinifyCompressor {
    pub fn new(api_key: Option<String>) -> Self {
        Self::new_with_client(api_key, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn compress(&self, api_key: &str, bytes: &[u8]) -> Result<Vec<u8>, String> {
        let shrink = self
            .client
            .post(format!("{}/shrink", self.base_url))
            .timeout(Duration::from_secs(30))
            .basic_auth("api", Some(api_key))
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| format!("shrink request failed: {}", e))?;

        if !shrink.status().is_success() {
            return Err(format!("shrink returned status {}", shrink.status()));
        }

        let shrink: ShrinkResponse = shrink
            .json()
            .await
            .map_err(|e| format!("unparseable shrink response: {}", e))?;

        // The output URL is absolute in production; tests hand back a
        // relative path on the mock server.
        let output_url = if shrink.output.url.starts_with("http") {
            shrink.output.url
        } else {
            format!("{}{}", self.base_url, shrink.output.url)
        };

        let resized = self
            .client
            .post(output_url)
            .timeout(Duration::from_secs(30))
            .basic_auth("api", Some(api_key))
            .json(&ResizeRequest {
                resize: ResizeSpec {
                    method: "cover".to_string(),
                    width: COVER_WIDTH,
                    height: COVER_HEIGHT,
                },
            })
            .send()
            .await
            .map_err(|e| format!("resize request failed: {}", e))?;

        if !resized.status().is_success() {
            return Err(format!("resize returned status {}", resized.status()));
        }

        resized
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("failed to read resized body: {}", e))
    }
}

#[async_trait]
impl PostProcessor for TinifyCompressor {
    async fn process(&self, bytes: Vec<u8>, mime: &str) -> (Vec<u8>, String) {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                tracing::debug!("Tinify key not configured, skipping compression");
                return (bytes, mime.to_string());
            }
        };

        if !mime.starts_with("image/") {
            return (bytes, mime.to_string());
        }

        match self.compress(api_key, &bytes).await {
            Ok(compressed) => {
                tracing::info!(
                    "Compressed image {} -> {} bytes",
                    bytes.len(),
                    compressed.len()
                );
                // Tinify preserves the input format.
                (compressed, mime.to_string())
            }
            Err(reason) => {
                tracing::warn!("Compression degraded to passthrough: {}", reason);
                (bytes, mime.to_string())
            }
        }
    }
}
