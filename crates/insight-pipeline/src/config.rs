//! Configuration types for an insight session.
//!
//! This module provides configuration options using the builder pattern.
//! Every knob has a default matching the classic desktop behavior, so
//! `SessionConfig::default()` is what most callers want.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application title printed at the top of exported log images.
pub const APP_TITLE: &str =
    "Data Insight Pro: Unstructured Data Management and Insights Extraction";

/// Configuration for a [`Session`](crate::Session).
///
/// Use [`SessionConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use insight_pipeline::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .preview_rows(10)
///     .split_seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of rows shown in the quality report preview.
    /// Default: 5
    pub preview_rows: usize,

    /// Fraction of rows held out for scoring the regression baseline (0.0 - 1.0).
    /// Default: 0.2
    pub test_fraction: f64,

    /// Seed of the train/test permutation.
    /// Default: 42
    pub split_seed: u64,

    /// Maximum number of numeric columns drawn by multi-column charts.
    /// Default: 8
    pub max_chart_columns: usize,

    /// Number of bins of each histogram.
    /// Default: 10
    pub histogram_bins: usize,

    /// IQR multiplier of the box plot outlier fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Pixel size of a figure holding a single chart.
    /// Default: 800 x 600
    pub chart_size: (u32, u32),

    /// Pixel height of each panel when all charts are stacked.
    /// Default: 400
    pub panel_height: u32,

    /// Candidate font files for chart and log text, tried in order.
    pub font_paths: Vec<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            test_fraction: 0.2,
            split_seed: 42,
            max_chart_columns: 8,
            histogram_bins: 10,
            iqr_multiplier: 1.5,
            chart_size: (800, 600),
            panel_height: 400,
            font_paths: default_font_paths(),
        }
    }
}

/// Well-known locations of a sans-serif TrueType font.
fn default_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "test_fraction".to_string(),
                value: self.test_fraction,
            });
        }

        if self.max_chart_columns == 0 {
            return Err(ConfigValidationError::ZeroCount("max_chart_columns".to_string()));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::ZeroCount("histogram_bins".to_string()));
        }

        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        let (width, height) = self.chart_size;
        if width == 0 || height == 0 || self.panel_height == 0 {
            return Err(ConfigValidationError::ZeroCount("chart dimensions".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("'{0}' must be at least 1")]
    ZeroCount(String),

    #[error("Invalid IQR multiplier: {0} (must be a non-negative number)")]
    InvalidMultiplier(f64),
}

impl From<ConfigValidationError> for crate::error::InsightError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::InsightError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`SessionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    preview_rows: Option<usize>,
    test_fraction: Option<f64>,
    split_seed: Option<u64>,
    max_chart_columns: Option<usize>,
    histogram_bins: Option<usize>,
    iqr_multiplier: Option<f64>,
    chart_size: Option<(u32, u32)>,
    panel_height: Option<u32>,
    font_paths: Option<Vec<PathBuf>>,
}

impl SessionConfigBuilder {
    /// Set the number of preview rows in the quality report.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the held-out fraction of the regression split.
    ///
    /// # Arguments
    /// * `fraction` - Value strictly between 0.0 and 1.0 (e.g., 0.2 = 20%)
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }

    /// Set the seed of the train/test permutation.
    pub fn split_seed(mut self, seed: u64) -> Self {
        self.split_seed = Some(seed);
        self
    }

    /// Set the maximum number of columns drawn by multi-column charts.
    pub fn max_chart_columns(mut self, columns: usize) -> Self {
        self.max_chart_columns = Some(columns);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the IQR multiplier of the box plot fences.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the pixel size of a single-chart figure.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = Some((width, height));
        self
    }

    /// Set the pixel height of each stacked panel.
    pub fn panel_height(mut self, height: u32) -> Self {
        self.panel_height = Some(height);
        self
    }

    /// Replace the font search list.
    pub fn font_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.font_paths = Some(paths);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `SessionConfig` or an error if validation fails.
    pub fn build(self) -> Result<SessionConfig, ConfigValidationError> {
        let defaults = SessionConfig::default();
        let config = SessionConfig {
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            test_fraction: self.test_fraction.unwrap_or(defaults.test_fraction),
            split_seed: self.split_seed.unwrap_or(defaults.split_seed),
            max_chart_columns: self.max_chart_columns.unwrap_or(defaults.max_chart_columns),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            chart_size: self.chart_size.unwrap_or(defaults.chart_size),
            panel_height: self.panel_height.unwrap_or(defaults.panel_height),
            font_paths: self.font_paths.unwrap_or(defaults.font_paths),
        };

        config.validate()?;
        Ok(config)
    }
}
