//! Data cleaning module.
//!
//! This module provides functionality for:
//! - Removing rows with missing values
//! - Removing exact duplicate rows (first occurrence kept)
//! - Removing IQR outliers of one column (used by the box plot)

mod outliers;

pub use outliers::{IqrFences, OutlierFilter};

use polars::prelude::*;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::CleaningSummary;

/// Data cleaner producing the cleaned table.
pub struct DataCleaner;

impl DataCleaner {
    /// Drop rows with any missing value, then drop exact duplicate rows.
    ///
    /// Row order is preserved and the input is not touched. Running the
    /// cleaner on its own output returns an identical table.
    pub fn clean(dataset: &Dataset) -> Result<(Dataset, CleaningSummary, Vec<String>)> {
        let mut cleaning_actions = Vec::new();
        let df = dataset.frame();
        let rows_before = df.height();

        info!("Performing data cleaning...");

        // 1. Remove rows with missing values
        let complete = nan_as_null(df)?.drop_nulls::<String>(None)?;
        let missing_rows_removed = rows_before - complete.height();

        if missing_rows_removed > 0 {
            cleaning_actions.push(format!(
                "Removed {} rows with missing values ({:.1}%)",
                missing_rows_removed,
                percentage(missing_rows_removed, rows_before)
            ));
            debug!("Removed {} rows with missing values", missing_rows_removed);
        } else {
            cleaning_actions.push("No rows with missing values found".to_string());
        }

        // 2. Remove duplicate rows
        let before_duplicates = complete.height();
        let unique = complete.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let duplicate_rows_removed = before_duplicates - unique.height();

        if duplicate_rows_removed > 0 {
            cleaning_actions.push(format!(
                "Removed {} duplicate rows ({:.1}%)",
                duplicate_rows_removed,
                percentage(duplicate_rows_removed, before_duplicates)
            ));
            debug!("Removed {} duplicate rows", duplicate_rows_removed);
        } else {
            cleaning_actions.push("No duplicate rows found".to_string());
        }

        let summary = CleaningSummary {
            rows_before,
            missing_rows_removed,
            duplicate_rows_removed,
            rows_after: unique.height(),
        };

        Ok((Dataset::new(unique), summary, cleaning_actions))
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Replace NaN in float columns by null, so missing values have one form.
fn nan_as_null(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            let series = col.as_materialized_series();
            let column = match series.dtype() {
                DataType::Float64 => {
                    let ca = series.f64()?;
                    ca.set(&ca.is_nan(), None)?.into_series().into_column()
                }
                DataType::Float32 => {
                    let ca = series.f32()?;
                    ca.set(&ca.is_nan(), None)?.into_series().into_column()
                }
                _ => col.clone(),
            };
            Ok(column)
        })
        .collect::<PolarsResult<Vec<Column>>>()?;

    DataFrame::new(columns)
}
