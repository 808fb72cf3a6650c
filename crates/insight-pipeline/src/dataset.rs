//! In-memory table with its column schema.
//!
//! A [`Dataset`] pairs a polars `DataFrame` with the [`TableSchema`] derived
//! from it. The schema is computed when the dataset is built and recomputed
//! only when the frame is replaced through [`Dataset::replace_frame`], so
//! every consumer of one table version sees the same column roles.

use polars::prelude::*;

use crate::types::{ColumnInfo, TableSchema};
use crate::utils::column_role;

/// A table plus the schema computed from it.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    schema: TableSchema,
}

impl Dataset {
    /// Wrap a frame and compute its schema.
    pub fn new(df: DataFrame) -> Self {
        let schema = compute_schema(&df);
        Self { df, schema }
    }

    /// The underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// The column schema of the current frame.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.schema.numeric_columns()
    }

    /// Names of the categorical columns, in table order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.schema.categorical_columns()
    }

    /// Replace the frame and recompute the schema.
    pub fn replace_frame(&mut self, df: DataFrame) {
        self.schema = compute_schema(&df);
        self.df = df;
    }
}

/// Extract column metadata from a DataFrame.
pub fn compute_schema(df: &DataFrame) -> TableSchema {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| ColumnInfo {
            name: col.name().to_string(),
            dtype: format!("{:?}", col.dtype()),
            role: column_role(col.dtype()),
            null_count: col.null_count(),
        })
        .collect();

    TableSchema { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_computed_at_construction() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => ["x", "y", "z"],
            "c" => [1i64, 2, 3],
        ]
        .unwrap();

        let dataset = Dataset::new(df);
        assert_eq!(dataset.numeric_columns(), vec!["a", "c"]);
        assert_eq!(dataset.categorical_columns(), vec!["b"]);
        assert_eq!(dataset.schema().column("a").unwrap().null_count, 1);
    }

    #[test]
    fn test_replace_frame_recomputes_schema() {
        let mut dataset = Dataset::new(df!["a" => [1.0, 2.0]].unwrap());
        assert_eq!(dataset.numeric_columns(), vec!["a"]);

        dataset.replace_frame(df!["a" => ["one", "two"], "b" => [1i32, 2]].unwrap());
        assert_eq!(dataset.numeric_columns(), vec!["b"]);
        assert_eq!(dataset.categorical_columns(), vec!["a"]);
        assert_eq!(dataset.width(), 2);
    }
}
