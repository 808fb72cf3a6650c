//! Exporting tables and figures.
//!
//! - Table export writes the raw table as CSV (header row, no index).
//! - Figure export picks the format from the file extension:
//!   - `.pdf`: the figure on page one, the session log on the following pages
//!   - `.png`: the figure, plus the session log rendered to `<stem>_log.png`

mod pdf;

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::charts::{Figure, FigureRenderer, render_text_image};
use crate::config::{APP_TITLE, SessionConfig};
use crate::dataset::Dataset;
use crate::error::{InsightError, Result};

use pdf::{RgbImage, write_pdf};

/// File formats a figure can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Pdf,
    Png,
}

impl FigureFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(FigureFormat::Pdf),
            "png" => Ok(FigureFormat::Png),
            _ => Err(InsightError::UnsupportedFormat(ext)),
        }
    }
}

/// Path of the log image written next to a PNG export.
pub fn log_image_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "figure".to_string());
    path.with_file_name(format!("{}_log.png", stem))
}

/// Writes session artifacts to disk.
pub struct Exporter<'a> {
    config: &'a SessionConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    /// Write a table as CSV with a header row.
    pub fn export_table(&self, dataset: Option<&Dataset>, path: &Path) -> Result<()> {
        let dataset = dataset.ok_or_else(|| InsightError::NoData("no dataset to save".to_string()))?;
        write_csv(dataset.frame(), path)?;
        info!("Table exported to {}", path.display());
        Ok(())
    }

    /// Write a figure and the session log. Returns the files written.
    ///
    /// Nothing is written when the figure is missing or the extension is
    /// neither `.pdf` nor `.png`. A PNG export writes both images or neither.
    pub fn export_figure(
        &self,
        figure: Option<&Figure>,
        log_text: &str,
        path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let figure = figure.ok_or(InsightError::NoFigure)?;
        let format = FigureFormat::from_path(path)?;
        let renderer = FigureRenderer::new(self.config);

        let written = match format {
            FigureFormat::Png => {
                renderer.render_png(figure, path)?;
                let log_path = log_image_path(path);
                if let Err(e) = render_text_image(&log_path, APP_TITLE, log_text, self.config) {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!("Could not remove {}: {}", path.display(), remove_err);
                    }
                    return Err(e);
                }
                vec![path.to_path_buf(), log_path]
            }
            FigureFormat::Pdf => {
                let (pixels, (width, height)) = renderer.render_rgb(figure)?;
                let image = RgbImage {
                    pixels: &pixels,
                    width,
                    height,
                };
                write_pdf(path, &image, log_text)?;
                vec![path.to_path_buf()]
            }
        };

        info!("Figure exported to {} ({:?})", path.display(), format);
        Ok(written)
    }
}

/// Writes a DataFrame to a CSV file.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let path_str = path.display().to_string();
    let mut file = File::create(path).map_err(|e| InsightError::write(&path_str, e))?;

    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)
        .map_err(|e| InsightError::write(&path_str, e))
}
