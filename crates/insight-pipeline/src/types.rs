use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Schema Types
// ============================================================================

/// Role of a column for analysis purposes.
///
/// Numeric columns feed statistics, the regression baseline and most charts;
/// categorical (text) columns feed the pie chart. Everything else (booleans,
/// dates) is carried along but never analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Other,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Numeric => "numeric",
            ColumnRole::Categorical => "categorical",
            ColumnRole::Other => "other",
        };
        f.write_str(name)
    }
}

/// Information about a single column of a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Polars data type as string ("Int64", "Float64", "String").
    pub dtype: String,
    pub role: ColumnRole,
    pub null_count: usize,
}

/// Per-column schema of a table, computed once per table version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    /// Names of the columns with the given role, in table order.
    pub fn names_with_role(&self, role: ColumnRole) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|col| col.role == role)
            .map(|col| col.name.as_str())
            .collect()
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.names_with_role(ColumnRole::Numeric)
    }

    /// Names of the categorical columns, in table order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.names_with_role(ColumnRole::Categorical)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|col| col.name == name)
    }
}

/// Metadata about a loaded file.
///
/// Returned by the loader after successfully reading a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size_bytes: u64,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
}

// ============================================================================
// Report Types
// ============================================================================

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator). NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Quality report of the current table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub shape: (usize, usize),
    /// Textual preview of the first rows.
    pub head: String,
    pub columns: Vec<ColumnInfo>,
    pub statistics: Vec<NumericSummary>,
}

impl QualityReport {
    /// Total number of missing cells.
    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|col| col.null_count).sum()
    }

    /// Render the report as the text block appended to the session log.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Head of the dataset:\n");
        out.push_str(&self.head);
        out.push_str("\n\n");

        out.push_str("Data info:\n");
        out.push_str(&format!(
            "{} entries, {} columns\n",
            self.shape.0, self.shape.1
        ));
        out.push_str(&format!(
            " {:<4} {:<24} {:<16} {:<10} {}\n",
            "#", "Column", "Non-Null Count", "Dtype", "Role"
        ));
        for (idx, col) in self.columns.iter().enumerate() {
            out.push_str(&format!(
                " {:<4} {:<24} {:<16} {:<10} {}\n",
                idx,
                col.name,
                format!("{} non-null", self.shape.0 - col.null_count),
                col.dtype,
                col.role
            ));
        }
        out.push('\n');

        out.push_str("Null values:\n");
        for col in &self.columns {
            out.push_str(&format!("{:<24} {}\n", col.name, col.null_count));
        }
        out.push('\n');

        out.push_str("Statistical analysis:\n");
        if self.statistics.is_empty() {
            out.push_str("(no numeric columns)\n");
        } else {
            out.push_str(&format!(
                "{:<16} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
                "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
            ));
            for stats in &self.statistics {
                out.push_str(&format!(
                    "{:<16} {:>8} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
                    stats.column,
                    stats.count,
                    stats.mean,
                    stats.std,
                    stats.min,
                    stats.q25,
                    stats.median,
                    stats.q75,
                    stats.max
                ));
            }
        }

        out
    }
}

/// Goodness-of-fit of the regression baseline before and after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub features: [String; 2],
    pub target: String,
    /// R² on the held-out split of the raw (mean-imputed) table, when it has
    /// enough rows.
    pub r2_before: Option<f64>,
    /// R² on the held-out split of the cleaned table, when it has enough rows.
    pub r2_after: Option<f64>,
    /// Split sizes of the raw-table run.
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Row counts of one cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub missing_rows_removed: usize,
    pub duplicate_rows_removed: usize,
    pub rows_after: usize,
}

// ============================================================================
// Chart Selection
// ============================================================================

/// The chart kind selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    All,
    Histogram,
    BarPlot,
    PieChart,
    ScatterPlot,
    LinePlot,
    HeatMap,
    BoxPlot,
}

impl ChartKind {
    /// Every concrete chart, in the order "All" stacks them.
    pub const CHARTS: [ChartKind; 7] = [
        ChartKind::Histogram,
        ChartKind::BarPlot,
        ChartKind::PieChart,
        ChartKind::ScatterPlot,
        ChartKind::LinePlot,
        ChartKind::HeatMap,
        ChartKind::BoxPlot,
    ];

    /// Human-readable name, as shown in a chart picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::All => "All",
            ChartKind::Histogram => "Histogram",
            ChartKind::BarPlot => "Bar Plot",
            ChartKind::PieChart => "Pie Chart",
            ChartKind::ScatterPlot => "Scatter Plot",
            ChartKind::LinePlot => "Line Plot",
            ChartKind::HeatMap => "Heat Map",
            ChartKind::BoxPlot => "Box Plot",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    /// Accepts display names as well as kebab/snake case ("bar-plot", "heat_map").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        let kind = match key.as_str() {
            "all" => ChartKind::All,
            "histogram" => ChartKind::Histogram,
            "barplot" => ChartKind::BarPlot,
            "piechart" => ChartKind::PieChart,
            "scatterplot" => ChartKind::ScatterPlot,
            "lineplot" => ChartKind::LinePlot,
            "heatmap" => ChartKind::HeatMap,
            "boxplot" => ChartKind::BoxPlot,
            _ => return Err(format!("Unknown chart kind: {}", s)),
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_kind_parsing() {
        assert_eq!("Bar Plot".parse::<ChartKind>(), Ok(ChartKind::BarPlot));
        assert_eq!("heat-map".parse::<ChartKind>(), Ok(ChartKind::HeatMap));
        assert_eq!("BOX_PLOT".parse::<ChartKind>(), Ok(ChartKind::BoxPlot));
        assert_eq!("all".parse::<ChartKind>(), Ok(ChartKind::All));
        assert!("Select Visualization".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_display_names_parse_back() {
        for kind in ChartKind::CHARTS {
            assert_eq!(kind.display_name().parse::<ChartKind>(), Ok(kind));
        }
        assert!(!ChartKind::CHARTS.contains(&ChartKind::All));
    }

    #[test]
    fn test_schema_role_lookup() {
        let schema = TableSchema {
            columns: vec![
                ColumnInfo {
                    name: "age".to_string(),
                    dtype: "Int64".to_string(),
                    role: ColumnRole::Numeric,
                    null_count: 0,
                },
                ColumnInfo {
                    name: "city".to_string(),
                    dtype: "String".to_string(),
                    role: ColumnRole::Categorical,
                    null_count: 2,
                },
                ColumnInfo {
                    name: "score".to_string(),
                    dtype: "Float64".to_string(),
                    role: ColumnRole::Numeric,
                    null_count: 1,
                },
            ],
        };

        assert_eq!(schema.numeric_columns(), vec!["age", "score"]);
        assert_eq!(schema.categorical_columns(), vec!["city"]);
        assert_eq!(schema.column("city").map(|c| c.null_count), Some(2));
        assert!(schema.column("missing").is_none());
    }

    #[test]
    fn test_report_text_sections() {
        let report = QualityReport {
            shape: (3, 1),
            head: "shape: (3, 1)".to_string(),
            columns: vec![ColumnInfo {
                name: "x".to_string(),
                dtype: "Float64".to_string(),
                role: ColumnRole::Numeric,
                null_count: 1,
            }],
            statistics: vec![],
        };

        let text = report.render_text();
        assert!(text.contains("Head of the dataset:"));
        assert!(text.contains("Data info:"));
        assert!(text.contains("2 non-null"));
        assert!(text.contains("Null values:"));
        assert!(text.contains("Statistical analysis:"));
        assert_eq!(report.total_nulls(), 1);
    }
}
