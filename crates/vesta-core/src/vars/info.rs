//! Tabular variable introspection.
//!
//! Metadata is recomputed from the live table whenever a name is (re)bound;
//! it is never persisted separately.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value::any_value_to_json;

/// Number of rows included in a preview sample.
const HEAD_ROWS: usize = 5;

/// Schema entry for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Column dtype, rendered as text (`i64`, `f64`, `str`, ...).
    pub dtype: String,
    /// Number of null cells in the column.
    pub null_count: usize,
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Non-null cell count.
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// Introspection snapshot of a registered tabular variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Variable name the table is bound to.
    pub name: String,
    /// Row count.
    pub row_count: usize,
    /// Column count.
    pub column_count: usize,
    /// Estimated in-memory size in bytes.
    pub memory_bytes: usize,
    /// Ordered column schema with per-column null counts.
    pub columns: Vec<ColumnInfo>,
    /// First rows, normalized for the system boundary.
    pub head: Vec<BTreeMap<String, Value>>,
    /// Summary statistics, numeric columns only.
    pub summary: BTreeMap<String, ColumnStats>,
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn column_stats(series: &Series) -> polars::error::PolarsResult<ColumnStats> {
    let floats = series.cast(&DataType::Float64)?;
    let ca = floats.f64()?;
    Ok(ColumnStats {
        count: series.len() - series.null_count(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        median: ca.median(),
        max: ca.max(),
    })
}

impl TableInfo {
    /// Compute fresh metadata for a live table.
    ///
    /// A column whose statistics cannot be computed is skipped with a log
    /// line; the rest of the snapshot is still produced.
    pub fn compute(name: &str, df: &DataFrame) -> Self {
        let columns: Vec<ColumnInfo> = df
            .get_columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                dtype: c.dtype().to_string(),
                null_count: c.null_count(),
            })
            .collect();

        let head_df = df.head(Some(HEAD_ROWS));
        let mut head = Vec::with_capacity(head_df.height());
        for row in 0..head_df.height() {
            let mut cells = BTreeMap::new();
            for column in head_df.get_columns() {
                let cell = match column.get(row) {
                    Ok(value) => any_value_to_json(&value),
                    Err(e) => {
                        tracing::warn!(name, column = %column.name(), "preview cell unavailable: {e}");
                        Value::Null
                    }
                };
                cells.insert(column.name().to_string(), cell);
            }
            head.push(cells);
        }

        let mut summary = BTreeMap::new();
        for column in df.get_columns() {
            if !is_numeric(column.dtype()) {
                continue;
            }
            match column_stats(column.as_materialized_series()) {
                Ok(stats) => {
                    summary.insert(column.name().to_string(), stats);
                }
                Err(e) => {
                    tracing::warn!(name, column = %column.name(), "stats skipped: {e}");
                }
            }
        }

        Self {
            name: name.to_string(),
            row_count: df.height(),
            column_count: df.width(),
            memory_bytes: df.estimated_size(),
            columns,
            head,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> DataFrame {
        df!(
            "city" => ["ulm", "bonn", "kiel"],
            "pop" => [126.0, 336.0, f64::NAN],
            "rank" => [3i64, 1, 2],
        )
        .expect("valid sample frame")
    }

    #[test]
    fn test_schema_and_counts() {
        let info = TableInfo::compute("cities", &sample());
        assert_eq!(info.row_count, 3);
        assert_eq!(info.column_count, 3);
        assert_eq!(info.columns.len(), 3);
        assert_eq!(info.columns[0].name, "city");
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_head_is_normalized() {
        let info = TableInfo::compute("cities", &sample());
        assert_eq!(info.head.len(), 3);
        // NaN in the preview crosses the boundary as null.
        assert_eq!(info.head[2]["pop"], Value::Null);
        assert_eq!(info.head[0]["rank"], Value::Number(3i64.into()));
    }

    #[test]
    fn test_summary_numeric_columns_only() {
        let info = TableInfo::compute("cities", &sample());
        assert!(info.summary.contains_key("pop"));
        assert!(info.summary.contains_key("rank"));
        assert!(!info.summary.contains_key("city"));

        let rank = &info.summary["rank"];
        assert_eq!(rank.count, 3);
        assert_eq!(rank.min, Some(1.0));
        assert_eq!(rank.max, Some(3.0));
        assert_eq!(rank.mean, Some(2.0));
    }
}
