//! Custom error types for the insight pipeline.
//!
//! Every pipeline operation returns a [`Result`] with an [`InsightError`].
//! Failures are local to the operation that raised them: the session is left
//! exactly as it was before the call.
//!
//! Errors are serializable so a presentation layer can receive them as
//! `{ "code": ..., "message": ... }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::types::ChartKind;

/// The main error type for the insight pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The input file could not be read or parsed.
    #[error("Error reading file '{path}': {reason}")]
    Load { path: String, reason: String },

    /// The operation needs a loaded table and none is present.
    #[error("No data available: {0}")]
    NoData(String),

    /// A chart was requested before the dataset was preprocessed.
    #[error("No preprocessed data available to generate visualization")]
    NotPreprocessed,

    /// The dataset lacks the numeric columns the regression baseline needs.
    #[error(
        "Dataset does not have enough numerical columns for accuracy calculation \
         (need {required}, found {found})"
    )]
    InsufficientColumns { required: usize, found: usize },

    /// A chart's column requirements are not met.
    #[error("{chart} requires {requirement}")]
    IneligibleColumns {
        chart: ChartKind,
        requirement: String,
    },

    /// The export path has an extension no exporter handles.
    #[error("Invalid file extension '{0}'. Please choose either .pdf or .png")]
    UnsupportedFormat(String),

    /// Figure export was requested before any chart was generated.
    #[error("No visualization available to save")]
    NoFigure,

    /// Writing an export file failed.
    #[error("Error saving '{path}': {reason}")]
    Write { path: String, reason: String },

    /// The regression baseline could not be fitted.
    #[error("Regression failed: {0}")]
    Regression(String),

    /// Drawing a chart or the log image failed.
    #[error("Failed to render figure: {0}")]
    Render(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a [`InsightError::Load`] from any displayable cause.
    pub fn load(path: impl Into<String>, reason: impl ToString) -> Self {
        InsightError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`InsightError::Write`] from any displayable cause.
    pub fn write(path: impl Into<String>, reason: impl ToString) -> Self {
        InsightError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`InsightError::IneligibleColumns`] for a chart.
    pub fn ineligible(chart: ChartKind, requirement: impl Into<String>) -> Self {
        InsightError::IneligibleColumns {
            chart,
            requirement: requirement.into(),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::NoData(_) => "NO_DATA",
            Self::NotPreprocessed => "NOT_PREPROCESSED",
            Self::InsufficientColumns { .. } => "INSUFFICIENT_COLUMNS",
            Self::IneligibleColumns { .. } => "INELIGIBLE_COLUMNS",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::NoFigure => "NO_FIGURE",
            Self::Write { .. } => "WRITE_ERROR",
            Self::Regression(_) => "REGRESSION_FAILED",
            Self::Render(_) => "RENDER_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the error only reflects a missing precondition
    /// (nothing loaded, nothing cleaned, nothing rendered).
    pub fn is_precondition(&self) -> bool {
        match self {
            Self::NoData(_) | Self::NotPreprocessed | Self::NoFigure => true,
            Self::WithContext { source, .. } => source.is_precondition(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}
