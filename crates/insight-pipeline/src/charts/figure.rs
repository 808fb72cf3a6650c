//! Backend-independent chart model.
//!
//! A [`Figure`] holds the numbers each chart draws; the renderer turns it into
//! pixels and the exporter into files. Nothing here touches a drawing backend.

use serde::{Deserialize, Serialize};

use crate::types::ChartKind;

/// One rendered figure: a stack of panels plus the charts that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub panels: Vec<ChartPanel>,
    pub failures: Vec<ChartFailure>,
}

impl Figure {
    pub fn single(panel: ChartPanel) -> Self {
        Self {
            panels: vec![panel],
            failures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Kinds of the panels, top to bottom.
    pub fn kinds(&self) -> Vec<ChartKind> {
        self.panels.iter().map(|p| p.kind).collect()
    }

    pub fn panel(&self, kind: ChartKind) -> Option<&ChartPanel> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

/// A chart that could not be built in "All" mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFailure {
    pub chart: ChartKind,
    pub message: String,
}

/// One chart of a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPanel {
    pub kind: ChartKind,
    pub title: String,
    pub body: PanelBody,
}

/// Equal-width frequency bins of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Box-and-whisker statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub column: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Most extreme values still inside the 1.5·IQR fences.
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    /// Values beyond the whiskers, drawn as points.
    pub fliers: Vec<f64>,
}

/// What a panel draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelBody {
    /// Overlaid distributions, one per column.
    Histogram { series: Vec<HistogramSeries> },
    /// One bar per column: `(column, mode)`.
    Bar { bars: Vec<(String, f64)> },
    /// A single slice labelled with the column name.
    Pie { label: String, value: f64 },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// Melted `(column, value)` pairs; drawn as the per-column mean line.
    Line {
        categories: Vec<String>,
        points: Vec<(String, f64)>,
    },
    /// Single annotated cell.
    HeatMap { column: String, median: f64 },
    BoxPlot {
        x_label: String,
        y_label: String,
        boxes: Vec<BoxStats>,
    },
}

impl PanelBody {
    /// Mean value per category of a line body, in category order.
    pub fn line_means(categories: &[String], points: &[(String, f64)]) -> Vec<(String, f64)> {
        categories
            .iter()
            .filter_map(|category| {
                let values: Vec<f64> = points
                    .iter()
                    .filter(|(c, _)| c == category)
                    .map(|(_, v)| *v)
                    .collect();
                crate::utils::mean(&values).map(|m| (category.clone(), m))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_means_skip_empty_categories() {
        let categories = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let points = vec![
            ("a".to_string(), 1.0),
            ("b".to_string(), 4.0),
            ("a".to_string(), 3.0),
        ];
        assert_eq!(
            PanelBody::line_means(&categories, &points),
            vec![("a".to_string(), 2.0), ("b".to_string(), 4.0)]
        );
    }

    #[test]
    fn test_figure_lookup() {
        let figure = Figure::single(ChartPanel {
            kind: ChartKind::HeatMap,
            title: "Heat Map".to_string(),
            body: PanelBody::HeatMap {
                column: "x".to_string(),
                median: 2.0,
            },
        });
        assert_eq!(figure.kinds(), vec![ChartKind::HeatMap]);
        assert!(figure.panel(ChartKind::BoxPlot).is_none());
        assert!(!figure.is_empty());
    }
}
