//! Chart dispatch.
//!
//! Turns a [`ChartKind`] selection into a [`Figure`]. Charts are gated on the
//! cleaned table existing but plot the columns of the raw table. The box plot
//! is the only chart with a side effect: it drops the rows of the raw table
//! whose second numeric column falls outside the IQR fences.

mod builders;
mod figure;
mod fonts;
mod render;

pub use figure::{
    BoxStats, ChartFailure, ChartPanel, Figure, HistogramBin, HistogramSeries, PanelBody,
};
pub use render::{FigureRenderer, render_text_image};

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dataset::Dataset;
use crate::error::{InsightError, Result};
use crate::types::ChartKind;

use builders::BuiltChart;

/// Message logged after the box plot filtered the raw table.
pub const OUTLIERS_REMOVED: &str = "Outliers removed from the dataset.";

/// Builds figures from the session tables.
pub struct ChartDispatcher<'a> {
    config: &'a SessionConfig,
}

impl<'a> ChartDispatcher<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    /// Build the figure for `kind`.
    ///
    /// `cleaned` only gates the call. Status lines are appended to `log`.
    /// A single chart either succeeds completely or leaves `raw` untouched.
    /// In "All" mode each chart is tried in turn and failures are recorded in
    /// the figure; the call fails only when every chart fails.
    pub fn generate(
        &self,
        raw: &mut Dataset,
        cleaned: Option<&Dataset>,
        kind: ChartKind,
        log: &mut Vec<String>,
    ) -> Result<Figure> {
        if cleaned.is_none() {
            return Err(InsightError::NotPreprocessed);
        }

        if kind != ChartKind::All {
            let built = builders::build(kind, raw, self.config)?;
            return Ok(Figure::single(self.apply(built, raw, log)));
        }

        let mut figure = Figure::default();
        let mut first_error = None;

        for chart in ChartKind::CHARTS {
            match builders::build(chart, raw, self.config) {
                Ok(built) => figure.panels.push(self.apply(built, raw, log)),
                Err(e) => {
                    warn!("Skipping {}: {}", chart, e);
                    log.push(e.to_string());
                    figure.failures.push(ChartFailure {
                        chart,
                        message: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if figure.is_empty() => Err(e),
            _ => {
                debug!(
                    "Built {} of {} charts",
                    figure.panels.len(),
                    ChartKind::CHARTS.len()
                );
                Ok(figure)
            }
        }
    }

    /// Commit a built chart: apply its table change, return its panel.
    fn apply(&self, built: BuiltChart, raw: &mut Dataset, log: &mut Vec<String>) -> ChartPanel {
        if let Some(removal) = built.replacement {
            info!("Box plot removed {} outlier rows", removal.rows_removed);
            raw.replace_frame(removal.frame);
            log.push(OUTLIERS_REMOVED.to_string());
        }
        built.panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn raw() -> Dataset {
        Dataset::new(
            df![
                "a" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                "b" => [10.0, 11.0, 12.0, 11.0, 10.0, 900.0],
                "c" => [3i64, 1, 4, 1, 5, 9],
                "tag" => ["p", "q", "p", "p", "q", "r"],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_requires_cleaned_table() {
        let config = SessionConfig::default();
        let mut raw = raw();
        let mut log = Vec::new();

        let err = ChartDispatcher::new(&config)
            .generate(&mut raw, None, ChartKind::HeatMap, &mut log)
            .unwrap_err();
        assert!(matches!(err, InsightError::NotPreprocessed));
        assert!(log.is_empty());
    }

    #[test]
    fn test_single_chart_figure() {
        let config = SessionConfig::default();
        let mut raw = raw();
        let cleaned = raw.clone();
        let mut log = Vec::new();

        let figure = ChartDispatcher::new(&config)
            .generate(&mut raw, Some(&cleaned), ChartKind::ScatterPlot, &mut log)
            .unwrap();
        assert_eq!(figure.kinds(), vec![ChartKind::ScatterPlot]);
        assert!(figure.failures.is_empty());
        assert_eq!(raw.height(), 6);
    }

    #[test]
    fn test_box_plot_mutates_raw_only() {
        let config = SessionConfig::default();
        let mut raw = raw();
        let cleaned = raw.clone();
        let mut log = Vec::new();

        ChartDispatcher::new(&config)
            .generate(&mut raw, Some(&cleaned), ChartKind::BoxPlot, &mut log)
            .unwrap();
        assert_eq!(raw.height(), 5);
        assert_eq!(cleaned.height(), 6);
        assert_eq!(log, vec![OUTLIERS_REMOVED.to_string()]);
    }

    #[test]
    fn test_all_mode_stacks_charts_in_order() {
        let config = SessionConfig::default();
        let mut raw = raw();
        let cleaned = raw.clone();
        let mut log = Vec::new();

        let figure = ChartDispatcher::new(&config)
            .generate(&mut raw, Some(&cleaned), ChartKind::All, &mut log)
            .unwrap();
        assert_eq!(figure.kinds(), ChartKind::CHARTS.to_vec());
        assert!(figure.failures.is_empty());
        // Box plot runs last, so every other chart saw the full table
        assert_eq!(raw.height(), 5);
    }

    #[test]
    fn test_all_mode_records_failures() {
        let config = SessionConfig::default();
        let mut raw = Dataset::new(df!["a" => [1.0, 2.0], "b" => [3.0, 4.0]].unwrap());
        let cleaned = raw.clone();
        let mut log = Vec::new();

        let figure = ChartDispatcher::new(&config)
            .generate(&mut raw, Some(&cleaned), ChartKind::All, &mut log)
            .unwrap();
        let failed: Vec<ChartKind> = figure.failures.iter().map(|f| f.chart).collect();
        assert_eq!(failed, vec![ChartKind::Histogram, ChartKind::PieChart]);
        assert_eq!(figure.panels.len(), 5);
        assert!(log.iter().any(|l| l == "Histogram requires at least three numerical columns"));
    }

    #[test]
    fn test_all_mode_fails_when_every_chart_fails() {
        let config = SessionConfig::default();
        let mut raw = Dataset::new(df!["flag" => [true, false]].unwrap());
        let cleaned = raw.clone();
        let mut log = Vec::new();

        let err = ChartDispatcher::new(&config)
            .generate(&mut raw, Some(&cleaned), ChartKind::All, &mut log)
            .unwrap_err();
        assert!(matches!(
            err,
            InsightError::IneligibleColumns {
                chart: ChartKind::Histogram,
                ..
            }
        ));
    }
}
