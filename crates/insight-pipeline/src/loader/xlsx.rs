//! Spreadsheet reading.
//!
//! Only the first worksheet is read. Its first row holds the column names;
//! each remaining column is typed from its non-empty cells.

use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{InsightError, Result};

/// Storage type chosen for one spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Reads the first worksheet of an `.xlsx` workbook into a DataFrame.
pub(crate) fn read_xlsx_file(path: &Path) -> Result<DataFrame> {
    let path_str = path.display().to_string();

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| InsightError::load(&path_str, format!("failed to open Excel file: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightError::load(&path_str, "no worksheet found"))?
        .map_err(|e| InsightError::load(&path_str, format!("failed to read Excel range: {}", e)))?;

    range_to_frame(&range).map_err(|e| InsightError::load(&path_str, e))
}

/// Convert a cell range (header row first) into a DataFrame.
fn range_to_frame(range: &Range<Data>) -> std::result::Result<DataFrame, String> {
    let mut rows = range.rows();
    let header = rows.next().ok_or("worksheet is empty")?;
    let names = column_names(header);
    let body: Vec<&[Data]> = rows.collect();

    debug!("Excel sheet: {} columns, {} data rows", names.len(), body.len());

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            build_column(name, &cells)
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns).map_err(|e| e.to_string())
}

/// Header names; blanks become `column_N`, repeats get a `.N` suffix.
fn column_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::Empty => format!("column_{}", idx + 1),
                other => other.to_string().trim().to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn is_missing(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn infer_kind(cells: &[&Data]) -> CellKind {
    let mut kind: Option<CellKind> = None;

    for cell in cells.iter().filter(|c| !is_missing(c)) {
        let cell_kind = match cell {
            Data::Int(_) => CellKind::Int,
            Data::Float(f) if f.fract() == 0.0 && f.is_finite() => CellKind::Int,
            Data::Float(_) => CellKind::Float,
            Data::Bool(_) => CellKind::Bool,
            _ => return CellKind::Text,
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(CellKind::Int), CellKind::Float) | (Some(CellKind::Float), CellKind::Int) => {
                CellKind::Float
            }
            _ => return CellKind::Text,
        });
    }

    // An all-empty column carries no type; keep it numeric so it reads as nulls.
    kind.unwrap_or(CellKind::Float)
}

fn build_column(name: &str, cells: &[&Data]) -> Column {
    let name: PlSmallStr = name.into();

    let series = match infer_kind(cells) {
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| {
                    if is_missing(cell) {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            Series::new(name, values)
        }
    };

    Column::from(series)
}
