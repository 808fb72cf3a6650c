//! Quality report generation.
//!
//! This module summarizes a table for display:
//! - Preview of the first rows
//! - Per-column dtype, role and non-null count
//! - Per-column null counts
//! - Descriptive statistics of numeric columns

mod statistics;

pub(crate) use statistics::describe_numeric;

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::types::{ColumnRole, QualityReport};

/// Builds [`QualityReport`]s. Read-only: never mutates the dataset.
pub struct QualityReportGenerator;

impl QualityReportGenerator {
    /// Profile a dataset.
    ///
    /// `preview_rows` rows are rendered into the report's head preview.
    pub fn generate(dataset: &Dataset, preview_rows: usize) -> Result<QualityReport> {
        let df = dataset.frame();
        let head = format!("{}", df.head(Some(preview_rows)));

        let mut statistics = Vec::new();
        for col in &dataset.schema().columns {
            if col.role != ColumnRole::Numeric {
                continue;
            }
            let series = df
                .column(&col.name)
                .context(format!("Describing column '{}'", col.name))?
                .as_materialized_series();
            statistics.push(describe_numeric(series)?);
        }

        debug!(
            "Quality report: {} columns, {} numeric",
            dataset.width(),
            statistics.len()
        );

        Ok(QualityReport {
            shape: (dataset.height(), dataset.width()),
            head,
            columns: dataset.schema().columns.clone(),
            statistics,
        })
    }
}
