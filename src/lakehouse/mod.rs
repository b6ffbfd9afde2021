// Data lakehouse with bronze/silver/gold layers
//
// Each stage is a pure transform (`read_raw`, `clean_records`, `derive_gold`)
// wrapped by a `Lakehouse` method that also persists the stage's table to the
// configured `BlobStore` under `<prefix>_<YYYYMMDD_HHMMSS>.csv`.

mod bronze;
mod gold;
mod silver;

pub use bronze::read_raw;
pub use gold::{derive_gold, location_stats, GoldOutput};
pub use silver::clean_records;

use crate::config::{Config, LayerFolders};
use crate::error::Result;
use crate::record::{ConcertRecord, RawTable};
use crate::storage::{open_store, BlobStore};
use chrono::{Local, NaiveDateTime};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Bronze, Layer::Silver, Layer::Gold];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }

    /// Filename prefix of the persisted table
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Layer::Bronze => "konser_raw",
            Layer::Silver => "konser_cleaned",
            Layer::Gold => "konser_analytics",
        }
    }

    pub fn folder<'a>(&self, folders: &'a LayerFolders) -> &'a str {
        match self {
            Layer::Bronze => folders.bronze.as_str(),
            Layer::Silver => folders.silver.as_str(),
            Layer::Gold => folders.gold.as_str(),
        }
    }
}

impl std::str::FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bronze" => Ok(Layer::Bronze),
            "silver" => Ok(Layer::Silver),
            "gold" => Ok(Layer::Gold),
            other => Err(format!("unknown layer: {}", other)),
        }
    }
}

/// Every table produced by one Bronze -> Silver -> Gold run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub timestamp: String,
    pub budget: f64,
    pub bronze: RawTable,
    pub silver: Vec<ConcertRecord>,
    pub gold: GoldOutput,
}

pub struct Lakehouse {
    store: Box<dyn BlobStore>,
    folders: LayerFolders,
    run_started: NaiveDateTime,
}

impl Lakehouse {
    /// Open the storage backend selected by `config`
    pub fn new(config: &Config) -> Result<Self> {
        let store = open_store(config)?;
        Ok(Lakehouse::with_store(store, config.folders.clone()))
    }

    pub fn with_store(store: Box<dyn BlobStore>, folders: LayerFolders) -> Self {
        Lakehouse {
            store,
            folders,
            run_started: Local::now().naive_local(),
        }
    }

    /// Pin the run time used in persisted filenames
    pub fn with_run_time(mut self, run_started: NaiveDateTime) -> Self {
        self.run_started = run_started;
        self
    }

    /// Stamp subsequent files with the current time
    pub fn start_run(&mut self) {
        self.run_started = Local::now().naive_local();
    }

    pub fn timestamp(&self) -> String {
        self.run_started.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn filename(&self, layer: Layer) -> String {
        format!("{}_{}.csv", layer.file_prefix(), self.timestamp())
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    pub fn folders(&self) -> &LayerFolders {
        &self.folders
    }

    fn save(&self, layer: Layer, data: &[u8], rows: usize) -> Result<String> {
        let filename = self.filename(layer);
        let identifier = self
            .store
            .upload(data, &filename, layer.folder(&self.folders))?;

        tracing::info!(
            layer = layer.name(),
            backend = self.store.backend_name(),
            rows,
            "saved to {}",
            identifier
        );
        Ok(identifier)
    }

    /// Bronze -> Silver -> Gold under one run timestamp
    pub fn run(&mut self, source: &Path, budget: f64) -> Result<PipelineRun> {
        self.start_run();

        let bronze = self.ingest_bronze(source)?;
        let silver = self.transform_silver(&bronze)?;
        let gold = self.aggregate_gold(&silver, budget)?;

        Ok(PipelineRun {
            timestamp: self.timestamp(),
            budget,
            bronze,
            silver,
            gold,
        })
    }

    /// Newest `.csv` identifier per layer; timestamped names sort chronologically
    pub fn latest_outputs(&self) -> Result<Vec<(Layer, String)>> {
        let mut latest = Vec::new();
        for layer in Layer::ALL {
            let newest = self
                .store
                .list(layer.folder(&self.folders))?
                .into_iter()
                .filter(|id| id.ends_with(".csv"))
                .max();
            if let Some(id) = newest {
                latest.push((layer, id));
            }
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn run_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_filenames() {
        let lakehouse = Lakehouse::with_store(Box::new(MemoryStore::new()), LayerFolders::default())
            .with_run_time(run_time());

        assert_eq!(lakehouse.timestamp(), "20240315_090507");
        assert_eq!(lakehouse.filename(Layer::Bronze), "konser_raw_20240315_090507.csv");
        assert_eq!(lakehouse.filename(Layer::Silver), "konser_cleaned_20240315_090507.csv");
        assert_eq!(lakehouse.filename(Layer::Gold), "konser_analytics_20240315_090507.csv");
    }

    #[test]
    fn test_layer_from_str() {
        assert_eq!("Gold".parse::<Layer>(), Ok(Layer::Gold));
        assert!("platinum".parse::<Layer>().is_err());
        assert_eq!(Layer::Silver.folder(&LayerFolders::default()), "silver/");
    }

    #[test]
    fn test_latest_outputs_picks_newest_per_layer() {
        let store = MemoryStore::new();
        store.upload(b"", "konser_raw_20240101_000000.csv", "bronze/").unwrap();
        store.upload(b"", "konser_raw_20240301_000000.csv", "bronze/").unwrap();
        store.upload(b"", "notes.txt", "bronze/").unwrap();
        store.upload(b"", "konser_analytics_20240201_000000.csv", "gold/").unwrap();

        let lakehouse = Lakehouse::with_store(Box::new(store), LayerFolders::default());
        let latest = lakehouse.latest_outputs().unwrap();

        assert_eq!(
            latest,
            vec![
                (Layer::Bronze, "bronze/konser_raw_20240301_000000.csv".to_string()),
                (Layer::Gold, "gold/konser_analytics_20240201_000000.csv".to_string()),
            ]
        );
    }
}
