//! Table loading and persistence

use crate::error::{PrepError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loads tables from the formats the pipeline accepts
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with a header row and schema inference
    pub fn load_csv(path: &Path) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    }

    /// Load a Parquet file
    pub fn load_parquet(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        ParquetReader::new(file).finish().map_err(PrepError::from)
    }

    /// Load a JSON file
    pub fn load_json(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        JsonReader::new(file).finish().map_err(PrepError::from)
    }

    /// Detect the format from the file extension and load
    pub fn load(path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Self::load_csv(path),
            "parquet" | "pq" => Self::load_parquet(path),
            "json" | "jsonl" => Self::load_json(path),
            other => Err(PrepError::DataError(format!(
                "unsupported input format: '{other}'"
            ))),
        }
    }
}

/// Persists tables produced by the pipeline
pub struct DataSaver;

impl DataSaver {
    /// Write `df` as Parquet with the given compression
    pub fn save_parquet(
        df: &mut DataFrame,
        path: &Path,
        compression: ParquetCompression,
    ) -> Result<()> {
        let file = File::create(path)?;
        ParquetWriter::new(file).with_compression(compression).finish(df)?;
        Ok(())
    }

    /// Write `df` as uncompressed Parquet, the layout the downstream
    /// forecasting step reads
    pub fn save_parquet_uncompressed(df: &mut DataFrame, path: &Path) -> Result<()> {
        Self::save_parquet(df, path, ParquetCompression::Uncompressed)
    }

    /// Write `df` as CSV with a header row
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}
