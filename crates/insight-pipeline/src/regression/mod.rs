//! Linear-regression baseline.
//!
//! Measures how well the first two numeric columns predict the third, once on
//! the raw table and once on the cleaned table, so the effect of cleaning can
//! be read off as a change in R².
//!
//! Missing values are replaced by their column mean before fitting. This is a
//! biased baseline, not a model worth deploying.

mod ols;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::dataset::Dataset;
use crate::error::{InsightError, Result, ResultExt};
use crate::types::RegressionResult;
use crate::utils::{column_f64, mean};

use ols::{LinearModel, r2_score, train_test_split};

/// Minimum number of test rows R² is computed on.
const MIN_TEST_ROWS: usize = 2;

/// Columns used by the baseline: two features and one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionColumns {
    pub features: [String; 2],
    pub target: String,
}

impl RegressionColumns {
    /// First two numeric columns as features, the third as target.
    pub fn select(dataset: &Dataset) -> Result<Self> {
        match dataset.numeric_columns().as_slice() {
            [x1, x2, y, ..] => Ok(Self {
                features: [x1.to_string(), x2.to_string()],
                target: y.to_string(),
            }),
            found => Err(InsightError::InsufficientColumns {
                required: 3,
                found: found.len(),
            }),
        }
    }
}

/// R² of one fit and the split it was computed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionScore {
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fits and scores the baseline with a fixed split policy.
#[derive(Debug, Clone, Copy)]
pub struct BaselineRegressor {
    test_fraction: f64,
    seed: u64,
}

impl BaselineRegressor {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            seed,
        }
    }

    /// Score the baseline on one table with the given columns.
    pub fn score(&self, dataset: &Dataset, columns: &RegressionColumns) -> Result<RegressionScore> {
        let df = dataset.frame();
        let x1 = imputed_column(df, &columns.features[0])?;
        let x2 = imputed_column(df, &columns.features[1])?;
        let y = imputed_column(df, &columns.target)?;

        let split = train_test_split(df.height(), self.test_fraction, self.seed);
        if split.train.is_empty() || split.test.len() < MIN_TEST_ROWS {
            return Err(InsightError::Regression(format!(
                "not enough rows to split: {} train, {} test",
                split.train.len(),
                split.test.len()
            )));
        }

        let rows = |indices: &[usize]| -> (Vec<[f64; 2]>, Vec<f64>) {
            indices.iter().map(|&i| ([x1[i], x2[i]], y[i])).unzip()
        };
        let (train_x, train_y) = rows(&split.train);
        let (test_x, test_y) = rows(&split.test);

        let model = LinearModel::fit(&train_x, &train_y)?;
        let predicted: Vec<f64> = test_x.iter().map(|row| model.predict(row)).collect();
        let r2 = r2_score(&test_y, &predicted);

        debug!(
            "Baseline fit: coefficients {:?}, R² {:.4} on {} test rows",
            model.coefficients,
            r2,
            test_y.len()
        );

        Ok(RegressionScore {
            r2,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }

    /// Score the raw table, then the cleaned table (if any) with the same
    /// columns.
    ///
    /// Only column selection is an error. A table that cannot be scored
    /// (too few rows to split, a column without values) leaves its R² empty.
    pub fn evaluate(&self, raw: &Dataset, cleaned: Option<&Dataset>) -> Result<RegressionResult> {
        let columns = RegressionColumns::select(raw)?;
        let split = train_test_split(raw.height(), self.test_fraction, self.seed);

        let r2_before = self.optional_score(raw, &columns, "before");
        let r2_after = cleaned.and_then(|cleaned| self.optional_score(cleaned, &columns, "after"));

        let RegressionColumns { features, target } = columns;
        Ok(RegressionResult {
            features,
            target,
            r2_before,
            r2_after,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }

    fn optional_score(&self, dataset: &Dataset, columns: &RegressionColumns, stage: &str) -> Option<f64> {
        match self.score(dataset, columns) {
            Ok(score) => {
                info!("Baseline R² {} cleaning: {:.4}", stage, score.r2);
                Some(score.r2)
            }
            Err(e) => {
                warn!("Baseline could not be scored {} cleaning: {}", stage, e);
                None
            }
        }
    }
}

/// Column values as `f64` with missing entries replaced by the column mean.
fn imputed_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let values = column_f64(df, name).context(format!("Reading column '{}'", name))?;
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let fill = mean(&present)
        .ok_or_else(|| InsightError::Regression(format!("column '{}' has no values", name)))?;

    Ok(values.into_iter().map(|v| v.unwrap_or(fill)).collect())
}
