//! The insight session: one explicit context owning every piece of state.
//!
//! A [`Session`] holds the raw table, the cleaned table, the current chart
//! selection, the last rendered figure and the append-only session log. Each
//! operation either succeeds completely or returns an error and leaves the
//! state as it was; in both cases a status line is appended to the log.
//!
//! # Example
//!
//! ```rust,ignore
//! use insight_pipeline::{ChartKind, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default())?;
//! session.upload("sales.csv")?;
//! session.preprocess()?;
//! session.select_chart(ChartKind::All);
//! session.generate()?;
//! session.export_figure("report.pdf")?;
//! println!("{}", session.log().text());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::charts::{ChartDispatcher, Figure};
use crate::cleaner::DataCleaner;
use crate::config::SessionConfig;
use crate::dataset::Dataset;
use crate::error::{InsightError, Result};
use crate::export::{Exporter, FigureFormat, log_image_path};
use crate::loader::DatasetLoader;
use crate::profiler::QualityReportGenerator;
use crate::regression::{BaselineRegressor, RegressionColumns};
use crate::types::{ChartKind, CleaningSummary, FileInfo, QualityReport, RegressionResult};

// =============================================================================
// Session Log
// =============================================================================

/// Append-only log of session status lines, mirrored to `tracing`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionLog {
    lines: Vec<String>,
}

impl SessionLog {
    /// Append a line.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "insight_pipeline::session", "{}", line);
        self.lines.push(line);
    }

    /// Append an error message.
    fn push_error(&mut self, err: &InsightError) {
        if err.is_precondition() {
            warn!(target: "insight_pipeline::session", code = err.error_code(), "{}", err);
        } else {
            error!(target: "insight_pipeline::session", code = err.error_code(), "{}", err);
        }
        self.lines.push(err.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The whole log as newline-separated text.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

// =============================================================================
// Preprocess Outcome
// =============================================================================

/// Everything produced by [`Session::preprocess`].
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessOutcome {
    pub report: QualityReport,
    pub regression: RegressionResult,
    pub cleaning: CleaningSummary,
}

// =============================================================================
// Session
// =============================================================================

/// Owns the state of one analysis session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    raw: Option<Dataset>,
    cleaned: Option<Dataset>,
    file_info: Option<FileInfo>,
    selection: Option<ChartKind>,
    figure: Option<Figure>,
    log: SessionLog,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_config(SessionConfig::default())
    }
}

impl Session {
    /// Create a session with a validated configuration.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            raw: None,
            cleaned: None,
            file_info: None,
            selection: None,
            figure: None,
            log: SessionLog::default(),
        }
    }

    /// Record the outcome of an operation in the log and pass it through.
    fn logged<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.log.push_error(e);
        }
        result
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn raw(&self) -> Option<&Dataset> {
        self.raw.as_ref()
    }

    pub fn cleaned(&self) -> Option<&Dataset> {
        self.cleaned.as_ref()
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    pub fn selection(&self) -> Option<ChartKind> {
        self.selection
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    fn require_raw(&self) -> Result<&Dataset> {
        self.raw
            .as_ref()
            .ok_or_else(|| InsightError::NoData("no dataset loaded".to_string()))
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Load a table, replacing the raw table.
    ///
    /// The cleaned table of the previous file is discarded so charts cannot
    /// be drawn from a new file that was never preprocessed. The figure and
    /// the log are kept.
    pub fn upload(&mut self, path: impl AsRef<Path>) -> Result<&FileInfo> {
        let path = path.as_ref();
        let loaded = match DatasetLoader::load(path) {
            Ok(loaded) => loaded,
            Err(e) => return self.logged(Err(e)),
        };

        self.raw = Some(loaded.dataset);
        self.cleaned = None;
        self.log.push(format!("File uploaded: {}", path.display()));

        Ok(self.file_info.insert(loaded.file_info))
    }

    /// Profile the raw table without changing anything.
    pub fn quality_report(&mut self) -> Result<QualityReport> {
        let result = self
            .require_raw()
            .and_then(|raw| QualityReportGenerator::generate(raw, self.config.preview_rows));
        self.logged(result)
    }

    /// Clean the raw table into the cleaned table.
    pub fn clean(&mut self) -> Result<CleaningSummary> {
        let result = self.require_raw().and_then(DataCleaner::clean);
        let (cleaned, summary, actions) = self.logged(result)?;

        for action in actions {
            self.log.push(action);
        }
        self.cleaned = Some(cleaned);
        Ok(summary)
    }

    /// Score the regression baseline on the raw table and, when present, the
    /// cleaned table.
    pub fn regress(&mut self) -> Result<RegressionResult> {
        let regressor = self.regressor();
        let result = self
            .require_raw()
            .and_then(|raw| regressor.evaluate(raw, self.cleaned.as_ref()));
        let regression = self.logged(result)?;

        self.log_accuracy(&regression);
        Ok(regression)
    }

    /// Quality report, baseline before cleaning, cleaning, baseline after.
    ///
    /// The report is logged first. Without three numeric columns the call
    /// fails after the report and nothing is cleaned. A baseline that cannot
    /// be scored (too few rows) is logged as unavailable and the cleaned
    /// table is still committed.
    pub fn preprocess(&mut self) -> Result<PreprocessOutcome> {
        let report = self.quality_report()?;
        self.log.push(report.render_text());

        let regressor = self.regressor();
        let result = self.require_raw().and_then(|raw| {
            RegressionColumns::select(raw)?;
            let (cleaned, cleaning, actions) = DataCleaner::clean(raw)?;
            let regression = regressor.evaluate(raw, Some(&cleaned))?;
            Ok((cleaned, cleaning, actions, regression))
        });
        let (cleaned, cleaning, actions, regression) = self.logged(result)?;

        self.log.push(accuracy_line("before", regression.r2_before));
        for action in actions {
            self.log.push(action);
        }
        self.log.push(accuracy_line("after", regression.r2_after));
        self.cleaned = Some(cleaned);

        Ok(PreprocessOutcome {
            report,
            regression,
            cleaning,
        })
    }

    /// Select the chart kind the next [`generate`](Self::generate) draws.
    pub fn select_chart(&mut self, kind: ChartKind) {
        self.selection = Some(kind);
    }

    /// Build the selected chart(s) and replace the figure.
    pub fn generate(&mut self) -> Result<&Figure> {
        let Some(kind) = self.selection else {
            return self.logged(Err(InsightError::InvalidConfig(
                "No visualization selected".to_string(),
            )));
        };
        if self.cleaned.is_none() {
            return self.logged(Err(InsightError::NotPreprocessed));
        }
        let Some(raw) = self.raw.as_mut() else {
            return self.logged(Err(InsightError::NoData("no dataset loaded".to_string())));
        };

        let mut lines = Vec::new();
        let result =
            ChartDispatcher::new(&self.config).generate(raw, self.cleaned.as_ref(), kind, &mut lines);
        for line in lines {
            self.log.push(line);
        }

        let figure = self.logged(result)?;
        self.log.push("Visualization generated.");
        Ok(self.figure.insert(figure))
    }

    /// Select a chart kind and generate it.
    pub fn generate_chart(&mut self, kind: ChartKind) -> Result<&Figure> {
        self.select_chart(kind);
        self.generate()
    }

    /// Write the raw table (after any box-plot filtering) as CSV.
    pub fn export_table(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let result = Exporter::new(&self.config).export_table(self.raw.as_ref(), path);
        self.logged(result)?;

        self.log.push(format!("Cleaned dataset saved to {}", path.display()));
        Ok(())
    }

    /// Write the figure and the session log. Returns the files written.
    pub fn export_figure(&mut self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = path.as_ref();
        let log_text = self.log.text();
        let result =
            Exporter::new(&self.config).export_figure(self.figure.as_ref(), &log_text, path);
        let written = self.logged(result)?;

        match FigureFormat::from_path(path) {
            Ok(FigureFormat::Png) => self.log.push(format!(
                "Visualization saved to {} and log saved to {}",
                path.display(),
                log_image_path(path).display()
            )),
            _ => self.log.push(format!(
                "Visualization and log saved to {}",
                path.display()
            )),
        }
        Ok(written)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn regressor(&self) -> BaselineRegressor {
        BaselineRegressor::new(self.config.test_fraction, self.config.split_seed)
    }

    fn log_accuracy(&mut self, regression: &RegressionResult) {
        self.log.push(accuracy_line("before", regression.r2_before));
        if self.cleaned.is_some() {
            self.log.push(accuracy_line("after", regression.r2_after));
        }
    }
}

fn accuracy_line(stage: &str, r2: Option<f64>) -> String {
    match r2 {
        Some(r2) => format!("Accuracy {} data cleaning: {:.2}", stage, r2),
        None => format!(
            "Accuracy {} data cleaning: unavailable (too few rows to score)",
            stage
        ),
    }
}
