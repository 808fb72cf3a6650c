//! Integration tests for the data insight pipeline.
//!
//! These tests drive a [`Session`] end to end over the fixture tables.

use insight_pipeline::export::write_csv;
use insight_pipeline::{
    ChartKind, DataCleaner, Dataset, DatasetLoader, InsightError, PanelBody, Session,
    SessionConfig,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn test_config() -> SessionConfig {
    SessionConfig::builder()
        .font_paths(Vec::new())
        .build()
        .unwrap()
}

fn session_for(fixture: &str) -> Session {
    let mut session = Session::new(test_config()).unwrap();
    session.upload(fixtures_path().join(fixture)).unwrap();
    session
}

fn row_keys(df: &DataFrame) -> Vec<String> {
    (0..df.height())
        .map(|row| {
            df.get_columns()
                .iter()
                .map(|col| format!("{:?}", col.get(row).unwrap()))
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect()
}

fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

/// 100 rows; the second column has exactly five values far outside the fences.
fn write_outlier_table(path: &Path) {
    let id: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let value: Vec<f64> = (0..100)
        .map(|i| match i {
            7 => 500.0,
            23 => -300.0,
            41 => 650.0,
            68 => 720.0,
            90 => -410.0,
            _ => 50.0 + (i % 10) as f64,
        })
        .collect();
    let score: Vec<f64> = (0..100).map(|i| ((i * 7) % 13) as f64).collect();

    let df = df!["id" => id, "value" => value, "score" => score].unwrap();
    write_csv(&df, path).unwrap();
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_preserves_shape() {
    let loaded = DatasetLoader::load(fixtures_path().join("sales.csv")).unwrap();

    assert_eq!(loaded.dataset.height(), 14);
    assert_eq!(loaded.dataset.width(), 4);
    assert_eq!(loaded.file_info.name, "sales.csv");
    assert_eq!(loaded.file_info.row_count, 14);
    assert_eq!(loaded.dataset.numeric_columns(), vec!["units", "price", "revenue"]);
    assert_eq!(loaded.dataset.categorical_columns(), vec!["region"]);
}

#[test]
fn test_load_xlsx_types_columns() {
    let loaded = DatasetLoader::load(fixtures_path().join("sales.xlsx")).unwrap();
    let df = loaded.dataset.frame();

    assert_eq!(df.shape(), (5, 4));
    assert_eq!(loaded.file_info.name, "sales.xlsx");
    assert_eq!(df.column("region").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("units").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("price").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("revenue").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("price").unwrap().null_count(), 1);
    assert_eq!(loaded.dataset.numeric_columns(), vec!["units", "price", "revenue"]);
}

#[test]
fn test_preprocess_xlsx() {
    let mut session = session_for("sales.xlsx");
    let outcome = session.preprocess().unwrap();

    assert_eq!(outcome.cleaning.missing_rows_removed, 1);
    assert_eq!(session.cleaned().map(|d| d.height()), Some(4));
}

#[test]
fn test_load_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let err = DatasetLoader::load(&path).unwrap_err();
    assert_eq!(err.error_code(), "LOAD_ERROR");
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_cleaning_removes_missing_and_duplicate_rows() {
    let loaded = DatasetLoader::load(fixtures_path().join("sales.csv")).unwrap();
    let (cleaned, summary, actions) = DataCleaner::clean(&loaded.dataset).unwrap();

    assert_eq!(summary.rows_before, 14);
    assert_eq!(summary.missing_rows_removed, 2);
    assert_eq!(summary.duplicate_rows_removed, 1);
    assert_eq!(summary.rows_after, 11);
    assert_eq!(actions.len(), 2);

    let df = cleaned.frame();
    assert!(df.height() <= loaded.dataset.height());
    assert_eq!(total_nulls(df), 0);

    let keys = row_keys(df);
    let unique: HashSet<&String> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_cleaning_is_idempotent() {
    let loaded = DatasetLoader::load(fixtures_path().join("sales.csv")).unwrap();
    let (once, _, _) = DataCleaner::clean(&loaded.dataset).unwrap();
    let (twice, summary, actions) = DataCleaner::clean(&once).unwrap();

    assert!(twice.frame().equals_missing(once.frame()));
    assert_eq!(summary.rows_before, summary.rows_after);
    assert_eq!(summary.missing_rows_removed, 0);
    assert_eq!(summary.duplicate_rows_removed, 0);
    assert_eq!(
        actions,
        vec![
            "No rows with missing values found".to_string(),
            "No duplicate rows found".to_string(),
        ]
    );
}

// ============================================================================
// Preprocessing and Regression
// ============================================================================

#[test]
fn test_preprocess_sales() {
    let mut session = session_for("sales.csv");
    let outcome = session.preprocess().unwrap();

    assert_eq!(outcome.report.shape, (14, 4));
    assert_eq!(outcome.report.total_nulls(), 2);
    assert_eq!(outcome.regression.target, "revenue");
    assert!(outcome.regression.r2_after.is_some());
    assert_eq!(session.cleaned().map(|d| d.height()), Some(11));
    // Raw table is untouched by cleaning
    assert_eq!(session.raw().map(|d| d.height()), Some(14));

    let lines = session.log().lines();
    assert_eq!(lines[0], format!("File uploaded: {}", fixtures_path().join("sales.csv").display()));
    assert!(lines.iter().any(|l| l.starts_with("Accuracy before data cleaning: ")));
    assert!(lines.iter().any(|l| l.starts_with("Accuracy after data cleaning: ")));
}

#[test]
fn test_regression_is_deterministic() {
    let mut session = session_for("sales.csv");
    session.preprocess().unwrap();

    let first = session.regress().unwrap();
    let second = session.regress().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_preprocess_fails_with_two_numeric_columns() {
    let mut session = session_for("two_numeric.csv");
    let err = session.preprocess().unwrap_err();

    assert!(matches!(
        err,
        InsightError::InsufficientColumns {
            required: 3,
            found: 2
        }
    ));
    assert!(session.cleaned().is_none());
    // The quality report is still logged
    assert!(session.log().text().contains("Head of the dataset:"));
}

#[test]
fn test_preprocess_with_constant_feature() {
    let mut session = session_for("constant_feature.csv");
    let outcome = session.preprocess().unwrap();

    assert_eq!(outcome.regression.features, ["units".to_string(), "discount".to_string()]);
    let r2 = outcome.regression.r2_before.unwrap();
    assert!((r2 - 1.0).abs() < 1e-9, "r2 = {}", r2);
    assert_eq!(session.cleaned().map(|d| d.height()), Some(12));
    assert!(session.generate_chart(ChartKind::ScatterPlot).is_ok());
}

#[test]
fn test_preprocess_small_table() {
    let mut session = session_for("small.csv");
    let outcome = session.preprocess().unwrap();

    assert_eq!(outcome.regression.r2_before, None);
    assert_eq!(outcome.regression.r2_after, None);
    assert_eq!((outcome.regression.train_rows, outcome.regression.test_rows), (3, 1));
    assert_eq!(session.cleaned().map(|d| d.height()), Some(3));
    assert!(
        session
            .log()
            .lines()
            .iter()
            .any(|l| l == "Accuracy after data cleaning: unavailable (too few rows to score)")
    );
    assert!(session.generate_chart(ChartKind::All).is_ok());
}

// ============================================================================
// Charts
// ============================================================================

#[test]
fn test_any_chart_before_cleaning_fails() {
    let mut session = session_for("sales.csv");

    for kind in ChartKind::CHARTS.into_iter().chain([ChartKind::All]) {
        let err = session.generate_chart(kind).unwrap_err();
        assert!(matches!(err, InsightError::NotPreprocessed), "{}", kind);
    }
    assert!(session.figure().is_none());
}

#[test]
fn test_scatter_needs_two_numeric_columns() {
    let loaded = DatasetLoader::load(fixtures_path().join("one_numeric.csv")).unwrap();
    let cleaned = loaded.dataset.clone();
    let mut raw = loaded.dataset;

    let config = test_config();
    let mut log = Vec::new();
    let err = insight_pipeline::ChartDispatcher::new(&config)
        .generate(&mut raw, Some(&cleaned), ChartKind::ScatterPlot, &mut log)
        .unwrap_err();

    assert!(matches!(err, InsightError::IneligibleColumns { .. }));
    assert_eq!(raw.height(), 6);
}

#[test]
fn test_scatter_plot_on_two_numeric_columns() {
    let loaded = DatasetLoader::load(fixtures_path().join("two_numeric.csv")).unwrap();
    let cleaned = loaded.dataset.clone();
    let mut raw = loaded.dataset;

    let config = test_config();
    let mut log = Vec::new();
    let figure = insight_pipeline::ChartDispatcher::new(&config)
        .generate(&mut raw, Some(&cleaned), ChartKind::ScatterPlot, &mut log)
        .unwrap();

    match &figure.panels[0].body {
        PanelBody::Scatter {
            x_label,
            y_label,
            points,
        } => {
            assert_eq!(x_label, "temperature");
            assert_eq!(y_label, "humidity");
            assert_eq!(points.len(), 6);
        }
        other => panic!("unexpected panel {:?}", other),
    }
}

#[test]
fn test_box_plot_removes_outliers_from_raw_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outliers.csv");
    write_outlier_table(&path);

    let mut session = Session::new(test_config()).unwrap();
    session.upload(&path).unwrap();
    session.preprocess().unwrap();
    session.generate_chart(ChartKind::BoxPlot).unwrap();

    assert_eq!(session.raw().map(|d| d.height()), Some(95));
    // Cleaned table is not touched by the box plot
    assert_eq!(session.cleaned().map(|d| d.height()), Some(100));
    assert!(
        session
            .log()
            .lines()
            .iter()
            .any(|l| l == "Outliers removed from the dataset.")
    );
}

#[test]
fn test_all_charts_stack_panels() {
    let mut session = session_for("sales.csv");
    session.preprocess().unwrap();

    let figure = session.generate_chart(ChartKind::All).unwrap();
    assert_eq!(figure.kinds(), ChartKind::CHARTS.to_vec());
    assert!(figure.failures.is_empty());
    assert_eq!(session.log().lines().last().map(String::as_str), Some("Visualization generated."));
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_exported_table_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");

    let mut session = session_for("sales.csv");
    session.export_table(&path).unwrap();

    let reloaded = DatasetLoader::load(&path).unwrap();
    let raw = session.raw().unwrap();
    assert!(reloaded.dataset.frame().equals_missing(raw.frame()));
    assert_eq!(
        session.log().lines().last().cloned(),
        Some(format!("Cleaned dataset saved to {}", path.display()))
    );
}

#[test]
fn test_box_plot_then_export_writes_filtered_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("outliers.csv");
    let target = dir.path().join("filtered.csv");
    write_outlier_table(&source);

    let mut session = Session::new(test_config()).unwrap();
    session.upload(&source).unwrap();
    session.preprocess().unwrap();
    session.generate_chart(ChartKind::BoxPlot).unwrap();
    session.export_table(&target).unwrap();

    let reloaded = DatasetLoader::load(&target).unwrap();
    assert_eq!(reloaded.dataset.height(), 95);
}

#[test]
fn test_figure_export_pdf_and_png() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("sales.csv");
    session.preprocess().unwrap();
    session.generate_chart(ChartKind::HeatMap).unwrap();

    let pdf = dir.path().join("report.pdf");
    let written = session.export_figure(&pdf).unwrap();
    assert_eq!(written, vec![pdf.clone()]);
    let doc = lopdf::Document::load(&pdf).unwrap();
    assert!(doc.get_pages().len() >= 2);

    let png = dir.path().join("chart.png");
    let written = session.export_figure(&png).unwrap();
    assert_eq!(written, vec![png.clone(), dir.path().join("chart_log.png")]);
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn test_figure_export_failures() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("sales.csv");

    let err = session.export_figure(dir.path().join("chart.png")).unwrap_err();
    assert!(matches!(err, InsightError::NoFigure));

    session.preprocess().unwrap();
    session.generate_chart(ChartKind::BarPlot).unwrap();
    let gif = dir.path().join("chart.gif");
    let err = session.export_figure(&gif).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    assert!(!gif.exists());
}

#[test]
fn test_upload_replaces_tables() {
    let mut session = session_for("sales.csv");
    session.preprocess().unwrap();
    session.generate_chart(ChartKind::HeatMap).unwrap();

    session.upload(fixtures_path().join("two_numeric.csv")).unwrap();
    assert_eq!(session.raw().map(|d| d.width()), Some(3));
    assert!(session.cleaned().is_none());
    // Charts need the new table preprocessed
    assert!(matches!(
        session.generate_chart(ChartKind::ScatterPlot),
        Err(InsightError::NotPreprocessed)
    ));

    let raw: &Dataset = session.raw().unwrap();
    assert_eq!(raw.height(), 6);
}
