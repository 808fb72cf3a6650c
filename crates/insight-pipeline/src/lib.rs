//! Data Insight Pipeline Library
//!
//! Load a tabular dataset, report on its quality, measure how cleaning
//! changes a simple regression baseline, draw charts and export the results.
//!
//! # Overview
//!
//! - **Loading**: CSV and XLSX files into a Polars [`DataFrame`](polars::prelude::DataFrame)
//! - **Quality report**: head, schema, null counts and numeric summaries
//! - **Regression baseline**: R² of a two-feature linear fit before and after cleaning
//! - **Cleaning**: drop rows with missing values, then duplicate rows
//! - **Charts**: histogram, bar, pie, scatter, line, heat map and box plot
//!   panels, rendered to PNG with `plotters`
//! - **Export**: the table as CSV, the figure with the session log as PDF or PNG
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use insight_pipeline::{ChartKind, Session, SessionConfig};
//!
//! let config = SessionConfig::builder()
//!     .histogram_bins(30)
//!     .iqr_multiplier(1.5)
//!     .build()?;
//!
//! let mut session = Session::new(config)?;
//! session.upload("data.csv")?;
//!
//! let outcome = session.preprocess()?;
//! if let Some(r2) = outcome.regression.r2_before {
//!     println!("R² before: {:.2}", r2);
//! }
//!
//! session.generate_chart(ChartKind::All)?;
//! session.export_table("cleaned.csv")?;
//! session.export_figure("report.pdf")?;
//! ```
//!
//! # State
//!
//! A [`Session`] owns the raw table, the cleaned table, the chart selection,
//! the last figure and the session log. Operations that fail append the error
//! to the log and leave the rest of the state unchanged.
//!
//! The box plot is the one chart that edits data: it removes IQR outliers of
//! the second numeric column from the raw table.

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod loader;
pub mod profiler;
pub mod regression;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{ChartDispatcher, ChartPanel, Figure, FigureRenderer, PanelBody};
pub use cleaner::{DataCleaner, IqrFences, OutlierFilter};
pub use config::{APP_TITLE, ConfigValidationError, SessionConfig, SessionConfigBuilder};
pub use dataset::Dataset;
pub use error::{InsightError, Result as InsightResult, ResultExt};
pub use export::{Exporter, FigureFormat};
pub use loader::{DatasetLoader, LoadedTable, TableFormat};
pub use profiler::QualityReportGenerator;
pub use regression::{BaselineRegressor, RegressionColumns};
pub use session::{PreprocessOutcome, Session, SessionLog};
pub use types::{
    ChartKind, CleaningSummary, ColumnInfo, ColumnRole, FileInfo, NumericSummary, QualityReport,
    RegressionResult, TableSchema,
};
