use super::{RecordStore, StorageSink};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory blob sink with the same upsert semantics as the real one.
#[derive(Clone)]
pub struct MockStorageClient {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    fail_uploads: bool,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-media.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            fail_uploads: false,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make every `store` call fail, as if the backing service returned 500.
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageSink for MockStorageClient {
    async fn store(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        *self.upload_count.lock().unwrap() += 1;

        if self.fail_uploads {
            return Err(Error::UploadFailed(format!("{}: simulated outage", path)));
        }

        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(format!("{}/{}", self.base_url, path))
    }
}

/// In-memory record store capturing `(table, id, column, url)` updates.
#[derive(Clone)]
pub struct MockRecordClient {
    updates: Arc<Mutex<Vec<(String, String, String, String)>>>,
    fail_updates: bool,
}

impl MockRecordClient {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(Mutex::new(Vec::new())),
            fail_updates: false,
        }
    }

    pub fn with_failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn get_updates(&self) -> Vec<(String, String, String, String)> {
        self.updates.lock().unwrap().clone()
    }
}

impl Default for MockRecordClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockRecordClient {
    async fn set_url(&self, table: &str, id: &str, column: &str, url: &str) -> Result<()> {
        if self.fail_updates {
            return Err(Error::RecordUpdateFailed(format!(
                "{}[{}]: simulated failure",
                table, id
            )));
        }
        self.updates.lock().unwrap().push((
            table.to_string(),
            id.to_string(),
            column.to_string(),
            url.to_string(),
        ));
        Ok(())
    }
}
