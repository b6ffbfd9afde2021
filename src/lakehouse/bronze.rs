// Bronze: raw ingestion
// The source file is kept as text, cell for cell. No validation happens here.

use super::{Lakehouse, Layer};
use crate::error::{PipelineError, Result};
use crate::record::RawTable;
use std::fs::File;
use std::path::Path;

/// Read a CSV file with a header line into a `RawTable`
pub fn read_raw(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| PipelineError::Parse {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;

    let table = RawTable::from_reader(file).map_err(|source| PipelineError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if table.headers().is_empty() {
        return Err(PipelineError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    Ok(table)
}

impl Lakehouse {
    /// Load the raw CSV and persist it unchanged to the bronze folder
    pub fn ingest_bronze(&self, source: &Path) -> Result<RawTable> {
        let table = read_raw(source)?;
        tracing::debug!(
            source = %source.display(),
            columns = table.headers().len(),
            rows = table.len(),
            "bronze ingested"
        );

        self.save(Layer::Bronze, &table.to_csv_bytes()?, table.len())?;
        Ok(table)
    }
}
