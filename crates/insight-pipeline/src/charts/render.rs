//! Figure rendering with plotters.
//!
//! Each panel gets its own vertical slot of the canvas. Text (titles, axis
//! descriptions, annotations) is drawn best-effort: when no font could be
//! registered the geometry is still drawn and the text is skipped.

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

use super::figure::{BoxStats, ChartPanel, Figure, HistogramSeries, PanelBody};
use super::fonts::{FONT_FAMILY, ensure_font};
use crate::config::SessionConfig;
use crate::error::{InsightError, Result};
use crate::utils::{truncate_str, wrap_text};

const TITLE_HEIGHT: u32 = 32;
const TITLE_SIZE: f64 = 20.0;
const LABEL_SIZE: f64 = 14.0;

/// Size of the page image holding the session log (A4 at 100 dpi).
pub const LOG_PAGE_SIZE: (u32, u32) = (827, 1169);

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn render_err(e: impl Display) -> InsightError {
    InsightError::Render(e.to_string())
}

/// Draws figures to PNG files or RGB buffers.
pub struct FigureRenderer<'a> {
    config: &'a SessionConfig,
}

impl<'a> FigureRenderer<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        ensure_font(&config.font_paths);
        Self { config }
    }

    /// Pixel size of the canvas for a figure.
    pub fn canvas_size(&self, figure: &Figure) -> (u32, u32) {
        let (width, height) = self.config.chart_size;
        match figure.panels.len() {
            0 | 1 => (width, height),
            n => (width, self.config.panel_height * n as u32),
        }
    }

    /// Write the figure as a PNG file.
    pub fn render_png(&self, figure: &Figure, path: &Path) -> Result<()> {
        let size = self.canvas_size(figure);
        let root = BitMapBackend::new(path, size).into_drawing_area();
        self.draw(&root, figure)?;
        root.present()
            .map_err(|e| InsightError::write(path.display().to_string(), e))?;
        debug!("Figure written to {} ({}x{})", path.display(), size.0, size.1);
        Ok(())
    }

    /// Draw the figure into an RGB8 buffer; returns the pixels and their size.
    pub fn render_rgb(&self, figure: &Figure) -> Result<(Vec<u8>, (u32, u32))> {
        let size = self.canvas_size(figure);
        let mut buffer = vec![0u8; size.0 as usize * size.1 as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            self.draw(&root, figure)?;
            root.present().map_err(render_err)?;
        }
        Ok((buffer, size))
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
        root.fill(&WHITE).map_err(render_err)?;
        if figure.panels.is_empty() {
            return Ok(());
        }

        let slots = root.split_evenly((figure.panels.len(), 1));
        for (slot, panel) in slots.iter().zip(&figure.panels) {
            draw_panel(slot, panel)?;
        }
        Ok(())
    }
}

/// Render a block of text (title, blank line, wrapped body) to a PNG page.
pub fn render_text_image(path: &Path, title: &str, body: &str, config: &SessionConfig) -> Result<()> {
    let has_font = ensure_font(&config.font_paths);
    let (width, height) = LOG_PAGE_SIZE;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    if has_font {
        let style = (FONT_FAMILY, LABEL_SIZE).into_font().color(&BLACK);
        let text = format!("{}\n\n{}", title, body);
        let line_height = LABEL_SIZE as i32 + 4;
        let mut y = 40;

        for line in wrap_text(&text, 100) {
            if y + line_height > height as i32 - 40 {
                warn!("Log image truncated at {} px", y);
                break;
            }
            draw_text_tolerant(&root, &line, &style, (40, y));
            y += line_height;
        }
    }

    root.present()
        .map_err(|e| InsightError::write(path.display().to_string(), e))?;
    Ok(())
}

fn draw_text_tolerant<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    text: &str,
    style: &TextStyle<'_>,
    pos: (i32, i32),
) {
    if let Err(e) = area.draw_text(text, style, pos) {
        debug!("Skipping text '{}': {}", truncate_str(text, 32), e);
    }
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &ChartPanel) -> Result<()> {
    area.fill(&WHITE).map_err(render_err)?;
    let (header, body) = area.split_vertically(TITLE_HEIGHT);

    let (width, _) = header.dim_in_pixel();
    let title_style = (FONT_FAMILY, TITLE_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    draw_text_tolerant(&header, &panel.title, &title_style, (width as i32 / 2, 8));

    match &panel.body {
        PanelBody::Histogram { series } => draw_histogram(&body, series),
        PanelBody::Bar { bars } => draw_bars(&body, bars),
        PanelBody::Pie { label, value } => draw_pie(&body, label, *value),
        PanelBody::Scatter {
            x_label,
            y_label,
            points,
        } => draw_scatter(&body, x_label, y_label, points),
        PanelBody::Line { categories, points } => {
            draw_line(&body, &PanelBody::line_means(categories, points), points)
        }
        PanelBody::HeatMap { column, median } => draw_heat_map(&body, column, *median),
        PanelBody::BoxPlot {
            x_label,
            y_label,
            boxes,
        } => draw_boxes(&body, x_label, y_label, boxes),
    }
}

// =============================================================================
// Axes
// =============================================================================

/// Range covering `values` with a 5% margin; `0..1` when empty.
fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        0.0..1.0
    } else if lo == hi {
        (lo - 1.0)..(hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad)..(hi + pad)
    }
}

/// Range for bar-like values, always including zero.
fn zero_based_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo == hi {
        return 0.0..1.0;
    }
    let pad = (hi - lo) * 0.05;
    let start = if lo < 0.0 { lo - pad } else { 0.0 };
    let end = if hi > 0.0 { hi + pad } else { 0.0 };
    start..end
}

/// Range placing `n` categories at `0, 1, .., n - 1`.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

fn category_label(names: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < names.len() {
        truncate_str(&names[idx as usize], 16)
    } else {
        String::new()
    }
}

fn build_chart<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>> {
    ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x, y)
        .map_err(render_err)
}

/// Draw axes with descriptions; falls back to bare axes when text fails.
fn draw_mesh<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    x_desc: &str,
    y_desc: &str,
    categories: Option<&[String]>,
) {
    let formatter = |x: &f64| match categories {
        Some(names) => category_label(names, *x),
        None => format!("{:.2}", x),
    };

    let result = {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(x_desc)
            .y_desc(y_desc)
            .label_style((FONT_FAMILY, LABEL_SIZE))
            .axis_desc_style((FONT_FAMILY, LABEL_SIZE))
            .x_label_formatter(&formatter);
        if let Some(names) = categories {
            mesh.x_labels(names.len().max(1));
        }
        mesh.draw()
    };

    if let Err(e) = result {
        debug!("Axis text unavailable ({}), drawing bare axes", e);
        if let Err(e) = chart.configure_mesh().x_labels(0).y_labels(0).draw() {
            warn!("Failed to draw axes: {}", e);
        }
    }
}

// =============================================================================
// Panels
// =============================================================================

fn draw_histogram<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, series: &[HistogramSeries]) -> Result<()> {
    let bins = series.iter().flat_map(|s| s.bins.iter());
    let x = padded_range(bins.clone().flat_map(|b| [b.lower, b.upper]));
    let y = zero_based_range(bins.map(|b| b.count as f64 * 1.05));

    let mut chart = build_chart(area, x, y)?;
    let x_desc = series.last().map(|s| s.column.as_str()).unwrap_or("");
    draw_mesh(&mut chart, x_desc, "Frequency", None);

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(0.5);
        chart
            .draw_series(s.bins.iter().map(|b| {
                Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], color.filled())
            }))
            .map_err(render_err)?
            .label(s.column.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if let Err(e) = chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8).filled())
        .border_style(BLACK.stroke_width(1))
        .label_font((FONT_FAMILY, LABEL_SIZE))
        .draw()
    {
        debug!("Skipping histogram legend: {}", e);
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, bars: &[(String, f64)]) -> Result<()> {
    let names: Vec<String> = bars.iter().map(|(name, _)| name.clone()).collect();
    let y = zero_based_range(bars.iter().map(|(_, v)| *v));

    let mut chart = build_chart(area, category_range(bars.len()), y)?;
    let x_desc = names.last().map(String::as_str).unwrap_or("");
    draw_mesh(&mut chart, x_desc, "Mode", Some(names.as_slice()));

    chart
        .draw_series(bars.iter().enumerate().map(|(idx, (_, value))| {
            let x = idx as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *value)], BLUE.mix(0.7).filled())
        }))
        .map_err(render_err)?;
    Ok(())
}

fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, label: &str, value: f64) -> Result<()> {
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = (width.min(height) as i32 / 2 - 30).max(10);

    // A single value fills the whole pie
    area.draw(&Circle::new(center, radius, BLUE.mix(0.8).filled()))
        .map_err(render_err)?;
    debug!("Pie slice '{}' = {:.4}", label, value);

    let centered = (FONT_FAMILY, LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    draw_text_tolerant(area, "100.0%", &centered.color(&WHITE), center);
    draw_text_tolerant(
        area,
        label,
        &centered,
        (center.0 + radius + 20, center.1),
    );
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let x = padded_range(points.iter().map(|(x, _)| *x));
    let y = padded_range(points.iter().map(|(_, y)| *y));

    let mut chart = build_chart(area, x, y)?;
    draw_mesh(&mut chart, x_label, y_label, None);

    chart
        .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))
        .map_err(render_err)?;
    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    means: &[(String, f64)],
    points: &[(String, f64)],
) -> Result<()> {
    let names: Vec<String> = means.iter().map(|(name, _)| name.clone()).collect();
    let y = padded_range(means.iter().map(|(_, v)| *v));

    let mut chart = build_chart(area, category_range(names.len()), y)?;
    draw_mesh(&mut chart, "Columns", "Value", Some(names.as_slice()));

    let coords: Vec<(f64, f64)> = means
        .iter()
        .enumerate()
        .map(|(idx, (_, mean))| (idx as f64, *mean))
        .collect();
    chart
        .draw_series(LineSeries::new(coords.clone(), BLUE.stroke_width(2)))
        .map_err(render_err)?;
    chart
        .draw_series(coords.iter().map(|&c| Circle::new(c, 4, BLUE.filled())))
        .map_err(render_err)?;

    debug!("Line plot: {} points over {} columns", points.len(), names.len());
    Ok(())
}

fn draw_heat_map<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, column: &str, median: f64) -> Result<()> {
    let names = vec![column.to_string()];
    let mut chart = build_chart(area, category_range(1), -0.5..0.5)?;
    draw_mesh(&mut chart, "Columns", "Rows", Some(names.as_slice()));

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(-0.5, -0.5), (0.5, 0.5)],
            RGBColor(220, 90, 60).filled(),
        )))
        .map_err(render_err)?;

    let style = (FONT_FAMILY, TITLE_SIZE)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));
    if let Err(e) = chart.draw_series(std::iter::once(Text::new(
        format!("{:.2}", median),
        (0.0, 0.0),
        style,
    ))) {
        debug!("Skipping heat map annotation: {}", e);
    }
    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x_label: &str,
    y_label: &str,
    boxes: &[BoxStats],
) -> Result<()> {
    let names: Vec<String> = boxes.iter().map(|b| b.column.clone()).collect();
    let y = padded_range(
        boxes
            .iter()
            .flat_map(|b| [b.lower_whisker, b.upper_whisker].into_iter().chain(b.fliers.iter().copied())),
    );

    let mut chart = build_chart(area, category_range(boxes.len()), y)?;
    draw_mesh(&mut chart, x_label, y_label, Some(names.as_slice()));

    for (idx, stats) in boxes.iter().enumerate() {
        let x = idx as f64;
        let (left, right) = (x - 0.25, x + 0.25);
        let segments = [
            vec![(x, stats.q3), (x, stats.upper_whisker)],
            vec![(x, stats.q1), (x, stats.lower_whisker)],
            vec![(x - 0.1, stats.upper_whisker), (x + 0.1, stats.upper_whisker)],
            vec![(x - 0.1, stats.lower_whisker), (x + 0.1, stats.lower_whisker)],
        ];

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(left, stats.q1), (right, stats.q3)],
                BLUE.stroke_width(2),
            )))
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(left, stats.median), (right, stats.median)],
                GREEN.stroke_width(2),
            )))
            .map_err(render_err)?;
        chart
            .draw_series(segments.into_iter().map(|points| PathElement::new(points, BLACK.stroke_width(1))))
            .map_err(render_err)?;
        chart
            .draw_series(stats.fliers.iter().map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))))
            .map_err(render_err)?;
    }
    Ok(())
}
