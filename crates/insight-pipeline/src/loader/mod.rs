//! Dataset loading.
//!
//! Reads a `.csv` or `.xlsx` file into a [`Dataset`] and extracts the file
//! metadata the presentation layer shows after an upload.
//!
//! # Type Inference
//!
//! CSV files go through polars' reader, which samples the first 1000 rows to
//! infer column types. Spreadsheets are typed per column by [`xlsx`]: a column
//! whose non-empty cells are all numbers becomes numeric, anything else text.

mod xlsx;

use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{InsightError, Result};
use crate::types::FileInfo;

/// Tabular formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" => Some(TableFormat::Xlsx),
            _ => None,
        }
    }
}

/// A freshly loaded table and its file metadata.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub dataset: Dataset,
    pub file_info: FileInfo,
}

/// Reads tabular files into datasets.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a table from disk.
    ///
    /// Every failure (missing file, unknown extension, parse error) is
    /// reported as [`InsightError::Load`].
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedTable> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if !path.exists() {
            return Err(InsightError::load(&path_str, "file not found"));
        }

        let format = TableFormat::from_path(path).ok_or_else(|| {
            InsightError::load(&path_str, "unsupported format (expected .csv or .xlsx)")
        })?;

        let metadata = fs::metadata(path).map_err(|e| InsightError::load(&path_str, e))?;

        debug!("Reading {:?} file: {}", format, path_str);
        let df = match format {
            TableFormat::Csv => read_csv_file(path)?,
            TableFormat::Xlsx => xlsx::read_xlsx_file(path)?,
        };

        let dataset = Dataset::new(df);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let file_info = FileInfo {
            path: path_str,
            name: file_name,
            size_bytes: metadata.len(),
            row_count: dataset.height(),
            column_count: dataset.width(),
            columns: dataset.schema().columns.clone(),
        };

        info!(
            "Dataset loaded: {} ({} rows x {} columns)",
            file_info.name, file_info.row_count, file_info.column_count
        );

        Ok(LoadedTable { dataset, file_info })
    }
}

/// Reads a CSV file from disk into a Polars DataFrame.
///
/// The first row holds the column names; 1000 rows are sampled for type
/// inference.
pub fn read_csv_file(path: &Path) -> Result<DataFrame> {
    let path_str = path.display().to_string();

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.into()))
        .map_err(|e| InsightError::load(&path_str, e))?
        .finish()
        .map_err(|e| InsightError::load(&path_str, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_path(Path::new("a.csv")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("a.XLSX")), Some(TableFormat::Xlsx));
        assert_eq!(TableFormat::from_path(Path::new("a.json")), None);
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_csv_shape_and_metadata() {
        let (_dir, path) = write_temp("people.csv", "age,city,score\n30,Paris,1.5\n41,,2.5\n");

        let loaded = DatasetLoader::load(&path).unwrap();
        assert_eq!(loaded.dataset.height(), 2);
        assert_eq!(loaded.dataset.width(), 3);
        assert_eq!(loaded.file_info.name, "people.csv");
        assert_eq!(loaded.file_info.row_count, 2);
        assert!(loaded.file_info.size_bytes > 0);

        let city = loaded.dataset.schema().column("city").unwrap();
        assert_eq!(city.null_count, 1);
        assert_eq!(loaded.dataset.numeric_columns(), vec!["age", "score"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DatasetLoader::load("/definitely/not/here.csv").unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let (_dir, path) = write_temp("data.txt", "a,b\n1,2\n");
        let err = DatasetLoader::load(&path).unwrap_err();
        assert!(matches!(err, InsightError::Load { .. }));
        assert!(err.to_string().contains("unsupported format"));
    }

    #[test]
    fn test_load_corrupt_xlsx() {
        let (_dir, path) = write_temp("broken.xlsx", "this is not a zip archive");
        let err = DatasetLoader::load(&path).unwrap_err();
        assert!(matches!(err, InsightError::Load { .. }));
    }
}
