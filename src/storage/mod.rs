// Blob storage for persisted layer files
//
// One trait, several backends. The backend is picked once from `Config`
// (see `open_store`); callers never branch on it per call.

mod local;
mod memory;
mod minio;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use minio::MinioStore;

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence target keyed by folder + filename
///
/// Identifiers returned by `upload` and `list` are opaque to callers and are
/// accepted back by `download` and `delete` of the same store.
pub trait BlobStore: Send + Sync {
    /// Store `data` as `filename` inside `folder`, returning its identifier
    fn upload(&self, data: &[u8], filename: &str, folder: &str) -> StorageResult<String>;

    fn download(&self, identifier: &str) -> StorageResult<Vec<u8>>;

    /// Identifiers stored under `folder`, sorted
    fn list(&self, folder: &str) -> StorageResult<Vec<String>>;

    /// `Ok(false)` when there was nothing to delete
    fn delete(&self, identifier: &str) -> StorageResult<bool>;

    /// Time-limited direct download link, for backends that have one
    fn presigned_url(&self, _identifier: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    /// Short backend name for logs
    fn backend_name(&self) -> &str;
}

/// Build the backend selected by `config`
pub fn open_store(config: &Config) -> StorageResult<Box<dyn BlobStore>> {
    match config.storage {
        StorageBackend::Local => Ok(Box::new(LocalStore::new(
            &config.local_data_path,
            &config.folders,
        )?)),
        StorageBackend::Minio => Ok(Box::new(MinioStore::connect(
            &config.minio,
            config.presigned_expiry,
        )?)),
    }
}
