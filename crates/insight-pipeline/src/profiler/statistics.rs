//! Descriptive statistics for numeric columns.

use polars::prelude::*;

use crate::types::NumericSummary;
use crate::utils::{mean, non_null_f64, quantile_sorted, sample_std, sorted};

/// Describe one numeric column: count, mean, std, min, quartiles, max.
///
/// Missing values are skipped. An all-missing column reports a count of zero
/// and NaN for every statistic.
pub(crate) fn describe_numeric(series: &Series) -> PolarsResult<NumericSummary> {
    let values = sorted(&non_null_f64(series)?);
    let q = |p: f64| quantile_sorted(&values, p).unwrap_or(f64::NAN);

    Ok(NumericSummary {
        column: series.name().to_string(),
        count: values.len(),
        mean: mean(&values).unwrap_or(f64::NAN),
        std: sample_std(&values),
        min: q(0.0),
        q25: q(0.25),
        median: q(0.5),
        q75: q(0.75),
        max: q(1.0),
    })
}
