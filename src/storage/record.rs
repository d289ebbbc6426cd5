use super::RecordStore;
use crate::models::RecordConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Row-level update-by-id against a PostgREST-style endpoint.
pub struct RestRecordClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRecordClient {
    pub fn new(config: &RecordConfig) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &RecordConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl RecordStore for RestRecordClient {
    async fn set_url(&self, table: &str, id: &str, column: &str, url: &str) -> Result<()> {
        let endpoint = format!("{}/rest/v1/{}", self.base_url, table);
        let body = serde_json::json!({ column: url });

        let response = self
            .client
            .patch(&endpoint)
            .query(&[("id", format!("eq.{}", id))])
            .timeout(Duration::from_secs(15))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::RecordUpdateFailed(format!("{}[{}]: {}", table, id, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::RecordUpdateFailed(format!(
                "{}[{}]: status {}: {}",
                table, id, status, text
            )));
        }

        Ok(())
    }
}
