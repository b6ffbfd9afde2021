// Process-wide configuration
// Built once at startup (defaults -> TOML file -> environment) and passed by
// reference to whatever needs it. There is no global config.

use crate::error::ConfigError;
use crate::prescriptive::Weights;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// STORAGE SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under `local_data_path`
    Local,
    /// S3-compatible object store (MinIO)
    Minio,
}

impl StorageBackend {
    pub fn name(&self) -> &str {
        match self {
            StorageBackend::Local => "local",
            StorageBackend::Minio => "minio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MinioSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub secure: bool,
    pub bucket: String,
    pub region: String,
}

impl Default for MinioSettings {
    fn default() -> Self {
        MinioSettings {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            secure: false,
            bucket: "kpop-budget".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Folder (object prefix) per lakehouse layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayerFolders {
    pub bronze: String,
    pub silver: String,
    pub gold: String,
}

impl Default for LayerFolders {
    fn default() -> Self {
        LayerFolders {
            bronze: "bronze/".to_string(),
            silver: "silver/".to_string(),
            gold: "gold/".to_string(),
        }
    }
}

impl LayerFolders {
    pub fn all(&self) -> [&str; 3] {
        [self.bronze.as_str(), self.silver.as_str(), self.gold.as_str()]
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageBackend,
    pub minio: MinioSettings,
    pub folders: LayerFolders,
    pub local_data_path: PathBuf,
    /// Lifetime of presigned download URLs, in seconds
    pub presigned_expiry: u64,
    pub weights: Weights,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageBackend::Local,
            minio: MinioSettings::default(),
            folders: LayerFolders::default(),
            local_data_path: PathBuf::from("data/"),
            presigned_expiry: 3600,
            weights: Weights::default(),
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overlay environment variables. `lookup` returns the raw value of a key.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("USE_LOCAL_STORAGE") {
            self.storage = if parse_bool("USE_LOCAL_STORAGE", &v)? {
                StorageBackend::Local
            } else {
                StorageBackend::Minio
            };
        }
        if let Some(v) = lookup("STORAGE_BACKEND") {
            self.storage = match v.trim().to_lowercase().as_str() {
                "local" => StorageBackend::Local,
                "minio" => StorageBackend::Minio,
                _ => return Err(invalid("STORAGE_BACKEND", &v, "expected local or minio")),
            };
        }

        if let Some(v) = lookup("MINIO_ENDPOINT") {
            self.minio.endpoint = v;
        }
        if let Some(v) = lookup("MINIO_ACCESS_KEY") {
            self.minio.access_key = v;
        }
        if let Some(v) = lookup("MINIO_SECRET_KEY") {
            self.minio.secret_key = v;
        }
        if let Some(v) = lookup("MINIO_SECURE") {
            self.minio.secure = parse_bool("MINIO_SECURE", &v)?;
        }
        if let Some(v) = lookup("MINIO_BUCKET") {
            self.minio.bucket = v;
        }
        if let Some(v) = lookup("MINIO_REGION") {
            self.minio.region = v;
        }

        if let Some(v) = lookup("BRONZE_FOLDER") {
            self.folders.bronze = v;
        }
        if let Some(v) = lookup("SILVER_FOLDER") {
            self.folders.silver = v;
        }
        if let Some(v) = lookup("GOLD_FOLDER") {
            self.folders.gold = v;
        }
        if let Some(v) = lookup("LOCAL_DATA_PATH") {
            self.local_data_path = PathBuf::from(v);
        }

        if let Some(v) = lookup("PRESIGNED_EXPIRY") {
            self.presigned_expiry = v
                .trim()
                .parse()
                .map_err(|_| invalid("PRESIGNED_EXPIRY", &v, "expected whole seconds"))?;
        }

        if let Some(v) = lookup("WEIGHT_COST") {
            self.weights.cost = parse_f64("WEIGHT_COST", &v)?;
        }
        if let Some(v) = lookup("WEIGHT_REMAINING") {
            self.weights.remaining = parse_f64("WEIGHT_REMAINING", &v)?;
        }
        if let Some(v) = lookup("WEIGHT_EXPERIENCE") {
            self.weights.experience = parse_f64("WEIGHT_EXPERIENCE", &v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        if !self.weights.sums_to_one() {
            tracing::warn!(
                cost = self.weights.cost,
                remaining = self.weights.remaining,
                experience = self.weights.experience,
                "scoring weights do not sum to 1; prescriptive scores will not be in [0, 1]"
            );
        }

        Ok(())
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "expected a number"))
}
