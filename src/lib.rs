// Concert Expense Lakehouse - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;         // Layered settings: defaults, TOML file, environment
pub mod data_quality;   // Silver cleaning report
pub mod error;
pub mod lakehouse;      // Bronze -> Silver -> Gold stages
pub mod prescriptive;   // Budget-feasible ranking
pub mod record;         // Typed rows and CSV helpers
pub mod report;         // Text rendering for the CLI
pub mod storage;        // BlobStore backends: local, MinIO, memory

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{Config, LayerFolders, MinioSettings, StorageBackend};
pub use data_quality::{CleaningReport, QualityIssue, Severity};
pub use error::{ConfigError, PipelineError, Result, StorageError};
pub use lakehouse::{
    clean_records, derive_gold, location_stats, read_raw,
    GoldOutput, Lakehouse, Layer, PipelineRun,
};
pub use prescriptive::{PrescriptiveEngine, Recommendation, Weights};
pub use record::{
    Affordability, ConcertRecord, GoldRecord, LocationStats, RawTable, ScoredRecord,
    REQUIRED_COLUMNS,
};
pub use storage::{open_store, BlobStore, LocalStore, MemoryStore, MinioStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
