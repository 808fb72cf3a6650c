//! IQR outlier removal on a single column.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InsightError, Result, ResultExt};
use crate::utils::{column_f64, quantile_sorted, sorted};

/// Quartiles of a column and the fences derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    /// Fences `[q1 - k * iqr, q3 + k * iqr]` of the non-missing values.
    ///
    /// Returns `None` when the column has no values.
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let values = sorted(values);
        let q1 = quantile_sorted(&values, 0.25)?;
        let q3 = quantile_sorted(&values, 0.75)?;
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Inclusive range check.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Removes rows whose value in one column lies outside the IQR fences.
pub struct OutlierFilter;

impl OutlierFilter {
    /// Filter `df` on `column`.
    ///
    /// Rows with a missing value in that column fail the range test and are
    /// removed as well. Returns the filtered frame and the fences used.
    pub fn remove(df: &DataFrame, column: &str, multiplier: f64) -> Result<(DataFrame, IqrFences)> {
        let values = column_f64(df, column).context(format!("Reading column '{}'", column))?;

        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let fences = IqrFences::from_values(&present, multiplier).ok_or_else(|| {
            InsightError::NoData(format!("column '{}' has no values to compute quartiles", column))
        })?;

        let mask_values: Vec<bool> = values
            .iter()
            .map(|v| v.is_some_and(|val| fences.contains(val)))
            .collect();

        let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
        let filtered = df.filter(&mask)?;

        debug!(
            "IQR filter on '{}': [{:.4}, {:.4}], removed {} rows",
            column,
            fences.lower,
            fences.upper,
            df.height() - filtered.height()
        );

        Ok((filtered, fences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fences_linear_quartiles() {
        let fences = IqrFences::from_values(&[1.0, 2.0, 3.0, 4.0], 1.5).unwrap();
        assert_eq!(fences.q1, 1.75);
        assert_eq!(fences.q3, 3.25);
        assert_eq!(fences.lower, 1.75 - 2.25);
        assert_eq!(fences.upper, 3.25 + 2.25);
        assert!(IqrFences::from_values(&[], 1.5).is_none());
    }

    #[test]
    fn test_remove_drops_extremes_and_nulls() {
        let df = df![
            "id" => [1i64, 2, 3, 4, 5, 6, 7],
            "v" => [Some(10.0), Some(11.0), Some(12.0), Some(11.5), Some(500.0), None, Some(10.5)],
        ]
        .unwrap();

        let (filtered, fences) = OutlierFilter::remove(&df, "v", 1.5).unwrap();
        assert_eq!(filtered.height(), 5);
        assert!(!fences.contains(500.0));

        let ids: Vec<Option<i64>> = filtered.column("id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4), Some(7)]);
    }

    #[test]
    fn test_remove_keeps_tight_column() {
        let df = df!["v" => [5.0, 5.0, 5.0]].unwrap();
        let (filtered, _) = OutlierFilter::remove(&df, "v", 1.5).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_remove_unknown_column_errors() {
        let df = df!["v" => [1.0]].unwrap();
        assert!(OutlierFilter::remove(&df, "nope", 1.5).is_err());
    }
}
