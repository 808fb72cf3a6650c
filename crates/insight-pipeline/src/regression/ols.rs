//! Seeded train/test split, least squares fit and R² scoring.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{InsightError, Result};

/// Number of fitted parameters: intercept plus two slopes.
pub(crate) const PARAMETERS: usize = 3;

/// Row indices of the training and test splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded generator; the first `ceil(fraction * n)`
/// indices form the test split.
pub(crate) fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((test_fraction * n as f64).ceil() as usize).min(n);
    let train = indices.split_off(test_len);

    Split {
        train,
        test: indices,
    }
}

/// Fitted linear model `y = b0 + b1 * x1 + b2 * x2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LinearModel {
    pub coefficients: [f64; PARAMETERS],
}

impl LinearModel {
    /// Ordinary least squares with intercept.
    ///
    /// Features and target are centered, the slopes are the minimum-norm
    /// solution of the centered normal equations and the intercept restores
    /// the means. Constant or collinear features therefore still fit: a
    /// direction without variance gets a zero slope.
    pub fn fit(features: &[[f64; 2]], target: &[f64]) -> Result<Self> {
        if features.len() != target.len() {
            return Err(InsightError::Regression(format!(
                "{} feature rows but {} targets",
                features.len(),
                target.len()
            )));
        }
        if target.is_empty() {
            return Err(InsightError::Regression("no training rows".to_string()));
        }

        let n = target.len() as f64;
        let x_mean = [
            features.iter().map(|x| x[0]).sum::<f64>() / n,
            features.iter().map(|x| x[1]).sum::<f64>() / n,
        ];
        let y_mean = target.iter().sum::<f64>() / n;

        // Centered X^T X and X^T y
        let mut xtx = [[0.0; 2]; 2];
        let mut xty = [0.0; 2];
        for (row, y) in features.iter().zip(target) {
            let x = [row[0] - x_mean[0], row[1] - x_mean[1]];
            for i in 0..2 {
                xty[i] += x[i] * (y - y_mean);
                for j in 0..2 {
                    xtx[i][j] += x[i] * x[j];
                }
            }
        }

        let [b1, b2] = pseudo_solve(xtx, xty);
        let b0 = y_mean - b1 * x_mean[0] - b2 * x_mean[1];
        let coefficients = [b0, b1, b2];

        if !coefficients.iter().all(|v| v.is_finite()) {
            return Err(InsightError::Regression(
                "non-finite coefficients".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    pub fn predict(&self, row: &[f64; 2]) -> f64 {
        let [b0, b1, b2] = self.coefficients;
        b0 + b1 * row[0] + b2 * row[1]
    }
}

/// Minimum-norm solution of `a x = b` for a symmetric positive
/// semi-definite 2x2 matrix, through its eigen decomposition.
///
/// Eigenvalues below a relative tolerance are treated as zero.
fn pseudo_solve(a: [[f64; 2]; 2], b: [f64; 2]) -> [f64; 2] {
    let (p, q, r) = (a[0][0], a[0][1], a[1][1]);

    // Jacobi rotation diagonalising [[p, q], [q, r]]
    let theta = 0.5 * (2.0 * q).atan2(p - r);
    let (sin, cos) = theta.sin_cos();
    let vectors = [[cos, sin], [-sin, cos]];
    let values = [
        p * cos * cos + 2.0 * q * sin * cos + r * sin * sin,
        p * sin * sin - 2.0 * q * sin * cos + r * cos * cos,
    ];

    let largest = values[0].abs().max(values[1].abs());
    let tolerance = largest * 1e-12;

    let mut x = [0.0; 2];
    for (value, v) in values.iter().zip(&vectors) {
        if largest == 0.0 || value.abs() <= tolerance {
            continue;
        }
        let weight = (v[0] * b[0] + v[1] * b[1]) / value;
        x[0] += weight * v[0];
        x[1] += weight * v[1];
    }
    x
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target scores 1.0 when predicted exactly, else 0.0.
pub(crate) fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}
