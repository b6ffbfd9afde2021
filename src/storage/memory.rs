// In-process backend
// Identifiers are `folder + filename`, like object names in a bucket.

use super::{BlobStore, StorageResult};
use crate::error::StorageError;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still a consistent map; writes are single inserts
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryStore {
    fn upload(&self, data: &[u8], filename: &str, folder: &str) -> StorageResult<String> {
        let name = format!("{}{}", folder, filename);
        self.lock().insert(name.clone(), data.to_vec());
        Ok(name)
    }

    fn download(&self, identifier: &str) -> StorageResult<Vec<u8>> {
        self.lock()
            .get(identifier)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(identifier.to_string()))
    }

    fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .lock()
            .keys()
            .filter(|name| name.starts_with(folder))
            .cloned()
            .collect())
    }

    fn delete(&self, identifier: &str) -> StorageResult<bool> {
        Ok(self.lock().remove(identifier).is_some())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names_are_folder_plus_filename() {
        let store = MemoryStore::new();

        let id = store.upload(b"data", "konser_raw_x.csv", "bronze/").unwrap();
        store.upload(b"other", "konser_cleaned_x.csv", "silver/").unwrap();

        assert_eq!(id, "bronze/konser_raw_x.csv");
        assert_eq!(store.list("bronze/").unwrap(), vec!["bronze/konser_raw_x.csv"]);
        assert_eq!(store.download(&id).unwrap(), b"data");
        assert_eq!(store.len(), 2);

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(matches!(store.download(&id), Err(StorageError::NotFound(_))));
    }
}
