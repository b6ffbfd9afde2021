// Local filesystem backend
// Identifiers are file paths: `<root>/<folder>/<filename>`.

use super::{BlobStore, StorageResult};
use crate::config::LayerFolders;
use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open `root`, creating the three layer folders if needed
    pub fn new(root: &Path, folders: &LayerFolders) -> StorageResult<Self> {
        for folder in folders.all() {
            let path = root.join(folder);
            fs::create_dir_all(&path)
                .map_err(|e| StorageError::io(path.display().to_string(), e))?;
        }

        Ok(LocalStore {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.root.join(folder)
    }
}

impl BlobStore for LocalStore {
    fn upload(&self, data: &[u8], filename: &str, folder: &str) -> StorageResult<String> {
        let folder_path = self.folder_path(folder);
        fs::create_dir_all(&folder_path)
            .map_err(|e| StorageError::io(folder_path.display().to_string(), e))?;

        let path = folder_path.join(filename);
        let identifier = path.display().to_string();
        fs::write(&path, data).map_err(|e| StorageError::io(identifier.clone(), e))?;

        Ok(identifier)
    }

    fn download(&self, identifier: &str) -> StorageResult<Vec<u8>> {
        fs::read(identifier).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(identifier.to_string()),
            _ => StorageError::io(identifier, e),
        })
    }

    fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        let folder_path = self.folder_path(folder);
        let entries = match fs::read_dir(&folder_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(folder_path.display().to_string(), e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(folder_path.display().to_string(), e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path.display().to_string());
            }
        }
        files.sort();

        Ok(files)
    }

    fn delete(&self, identifier: &str) -> StorageResult<bool> {
        match fs::remove_file(identifier) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(identifier, e)),
        }
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
