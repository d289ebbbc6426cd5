//! Persistence for generated artifacts
//!
//! Two concerns live here: the blob sink that uploads bytes and hands back a
//! deterministic public URL, and the record store that points a database row
//! at that URL afterwards. The sink is required; the record write is a
//! secondary side effect whose failure handling is chosen per job.

pub mod blob;
pub mod mock;
pub mod record;

pub use blob::BlobStoreClient;
pub use mock::{MockRecordClient, MockStorageClient};
pub use record::RestRecordClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Upload bytes under `path` and return the public URL. Colliding paths
    /// overwrite silently (upsert semantics).
    async fn store(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Set `column` of the row `id` in `table` to `url`.
    async fn set_url(&self, table: &str, id: &str, column: &str, url: &str) -> Result<()>;
}
