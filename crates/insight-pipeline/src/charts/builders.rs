//! One builder per chart kind.
//!
//! Builders read the raw table and return the panel to draw. Only the box
//! plot proposes a change to the table, returned as a replacement frame the
//! dispatcher applies once the panel is complete.

use polars::prelude::*;

use super::figure::{BoxStats, ChartPanel, HistogramBin, HistogramSeries, PanelBody};
use crate::cleaner::{IqrFences, OutlierFilter};
use crate::config::SessionConfig;
use crate::dataset::Dataset;
use crate::error::{InsightError, Result, ResultExt};
use crate::types::ChartKind;
use crate::utils::{column_f64, median, mode, non_null_f64, quantile_sorted, sorted};

/// A finished panel and, for the box plot, the filtered raw table.
pub(crate) struct BuiltChart {
    pub panel: ChartPanel,
    pub replacement: Option<OutlierRemoval>,
}

pub(crate) struct OutlierRemoval {
    pub frame: DataFrame,
    pub rows_removed: usize,
}

impl BuiltChart {
    fn panel(kind: ChartKind, title: impl Into<String>, body: PanelBody) -> Self {
        Self {
            panel: ChartPanel {
                kind,
                title: title.into(),
                body,
            },
            replacement: None,
        }
    }
}

pub(crate) fn build(kind: ChartKind, raw: &Dataset, config: &SessionConfig) -> Result<BuiltChart> {
    match kind {
        ChartKind::Histogram => histogram(raw, config),
        ChartKind::BarPlot => bar_plot(raw, config),
        ChartKind::PieChart => pie_chart(raw),
        ChartKind::ScatterPlot => scatter_plot(raw),
        ChartKind::LinePlot => line_plot(raw, config),
        ChartKind::HeatMap => heat_map(raw),
        ChartKind::BoxPlot => box_plot(raw, config),
        ChartKind::All => Err(InsightError::InvalidConfig(
            "\"All\" is not a single chart".to_string(),
        )),
    }
}

/// Numeric column names, failing when fewer than `required` exist.
fn numeric_columns(
    raw: &Dataset,
    chart: ChartKind,
    required: usize,
    requirement: &str,
) -> Result<Vec<String>> {
    let numeric = raw.numeric_columns();
    if numeric.len() < required {
        return Err(InsightError::ineligible(chart, requirement));
    }
    Ok(numeric.into_iter().map(String::from).collect())
}

const TWO_NUMERIC: &str = "at least two numerical columns";

fn values(raw: &Dataset, column: &str) -> Result<Vec<f64>> {
    let col = raw
        .frame()
        .column(column)
        .context(format!("Reading column '{}'", column))?;
    Ok(non_null_f64(col.as_materialized_series())?)
}

// =============================================================================
// Histogram
// =============================================================================

fn histogram(raw: &Dataset, config: &SessionConfig) -> Result<BuiltChart> {
    let columns = numeric_columns(
        raw,
        ChartKind::Histogram,
        3,
        "at least three numerical columns",
    )?;

    let mut series = Vec::new();
    for column in columns.iter().take(config.max_chart_columns) {
        let values = values(raw, column)?;
        series.push(HistogramSeries {
            column: column.clone(),
            bins: histogram_bins(&values, config.histogram_bins),
        });
    }

    Ok(BuiltChart::panel(
        ChartKind::Histogram,
        ChartKind::Histogram.display_name(),
        PanelBody::Histogram { series },
    ))
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
/// A constant column is binned over `[v - 0.5, v + 0.5]`.
pub(crate) fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some((mut lo, mut hi)) = values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return Vec::new();
    };

    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}

// =============================================================================
// Bar, pie, scatter, line, heat map
// =============================================================================

fn bar_plot(raw: &Dataset, config: &SessionConfig) -> Result<BuiltChart> {
    let columns = numeric_columns(raw, ChartKind::BarPlot, 2, TWO_NUMERIC)?;

    let mut bars = Vec::new();
    for column in columns.iter().take(config.max_chart_columns) {
        if let Some(m) = mode(&values(raw, column)?) {
            bars.push((column.clone(), m));
        }
    }

    Ok(BuiltChart::panel(
        ChartKind::BarPlot,
        ChartKind::BarPlot.display_name(),
        PanelBody::Bar { bars },
    ))
}

fn pie_chart(raw: &Dataset) -> Result<BuiltChart> {
    let categorical = raw.categorical_columns();
    let Some(column) = categorical.first().map(|c| c.to_string()) else {
        return Err(InsightError::ineligible(
            ChartKind::PieChart,
            "at least one categorical column",
        ));
    };

    let series = raw
        .frame()
        .column(&column)
        .context(format!("Reading column '{}'", column))?
        .as_materialized_series();
    let present = series.len() - series.null_count();
    let distinct = series.drop_nulls().n_unique()?;
    if distinct == 0 {
        return Err(InsightError::NoData(format!("column '{}' has no values", column)));
    }

    // Mean of the value counts
    let value = present as f64 / distinct as f64;

    Ok(BuiltChart::panel(
        ChartKind::PieChart,
        format!("Pie Chart for {}", column),
        PanelBody::Pie {
            label: column,
            value,
        },
    ))
}

fn scatter_plot(raw: &Dataset) -> Result<BuiltChart> {
    let columns = numeric_columns(raw, ChartKind::ScatterPlot, 2, TWO_NUMERIC)?;
    let (x_label, y_label) = (columns[0].clone(), columns[1].clone());

    let xs = column_f64(raw.frame(), &x_label)?;
    let ys = column_f64(raw.frame(), &y_label)?;
    let points = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();

    Ok(BuiltChart::panel(
        ChartKind::ScatterPlot,
        ChartKind::ScatterPlot.display_name(),
        PanelBody::Scatter {
            x_label,
            y_label,
            points,
        },
    ))
}

fn line_plot(raw: &Dataset, config: &SessionConfig) -> Result<BuiltChart> {
    let columns = numeric_columns(raw, ChartKind::LinePlot, 2, TWO_NUMERIC)?;
    let categories: Vec<String> = columns.into_iter().take(config.max_chart_columns).collect();

    // Melt to long format, column by column
    let mut points = Vec::new();
    for column in &categories {
        points.extend(values(raw, column)?.into_iter().map(|v| (column.clone(), v)));
    }

    Ok(BuiltChart::panel(
        ChartKind::LinePlot,
        ChartKind::LinePlot.display_name(),
        PanelBody::Line { categories, points },
    ))
}

fn heat_map(raw: &Dataset) -> Result<BuiltChart> {
    let columns = numeric_columns(raw, ChartKind::HeatMap, 2, TWO_NUMERIC)?;
    let column = columns[0].clone();

    let median = median(&values(raw, &column)?)
        .ok_or_else(|| InsightError::NoData(format!("column '{}' has no values", column)))?;

    Ok(BuiltChart::panel(
        ChartKind::HeatMap,
        ChartKind::HeatMap.display_name(),
        PanelBody::HeatMap { column, median },
    ))
}

// =============================================================================
// Box plot
// =============================================================================

fn box_plot(raw: &Dataset, config: &SessionConfig) -> Result<BuiltChart> {
    let columns = numeric_columns(raw, ChartKind::BoxPlot, 2, TWO_NUMERIC)?;
    let (first, second) = (columns[0].clone(), columns[1].clone());

    // Boxes describe the table before outliers are dropped
    let boxes = vec![
        box_stats(&first, &values(raw, &first)?, config.iqr_multiplier),
        box_stats(&second, &values(raw, &second)?, config.iqr_multiplier),
    ]
    .into_iter()
    .flatten()
    .collect();

    let (frame, _) = OutlierFilter::remove(raw.frame(), &second, config.iqr_multiplier)?;
    let rows_removed = raw.height() - frame.height();

    Ok(BuiltChart {
        panel: ChartPanel {
            kind: ChartKind::BoxPlot,
            title: ChartKind::BoxPlot.display_name().to_string(),
            body: PanelBody::BoxPlot {
                x_label: first,
                y_label: second,
                boxes,
            },
        },
        replacement: Some(OutlierRemoval {
            frame,
            rows_removed,
        }),
    })
}

/// Quartiles, whiskers and fliers; `None` for a column without values.
pub(crate) fn box_stats(column: &str, values: &[f64], multiplier: f64) -> Option<BoxStats> {
    let values = sorted(values);
    let fences = IqrFences::from_values(&values, multiplier)?;
    let median = quantile_sorted(&values, 0.5)?;

    let inside: Vec<f64> = values.iter().copied().filter(|v| fences.contains(*v)).collect();
    let lower_whisker = inside.first().copied().unwrap_or(fences.q1);
    let upper_whisker = inside.last().copied().unwrap_or(fences.q3);
    let fliers = values.iter().copied().filter(|v| !fences.contains(*v)).collect();

    Some(BoxStats {
        column: column.to_string(),
        q1: fences.q1,
        median,
        q3: fences.q3,
        lower_whisker,
        upper_whisker,
        fliers,
    })
}
