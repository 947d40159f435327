//! Variable export to data files.
//!
//! Exports resolve against the workspace `data/` sandbox; a path that walks
//! out of the sandbox is rejected before anything touches the filesystem.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::resolve_sandboxed;
use crate::vars::value::any_value_to_json;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Delimited text (`.csv`).
    Csv,
    /// Spreadsheet workbook (`.xlsx`).
    Excel,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Caller-supplied save options, merged over the defaults.
///
/// Defaults: header row on, `,` separator, worksheet named `Sheet1`, no row
/// index column in either format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Write a header row. Default `true`.
    pub include_header: Option<bool>,
    /// Field separator for delimited text. Default `,`.
    pub separator: Option<char>,
    /// Worksheet name for spreadsheet output. Default `Sheet1`.
    pub sheet_name: Option<String>,
}

/// Result descriptor for a completed export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Path relative to the data sandbox.
    pub path: String,
    /// Format actually written.
    pub format: ExportFormat,
    /// Size of the written file in bytes.
    pub byte_size: u64,
    /// RFC 3339 timestamp of the write.
    pub saved_at: String,
}

/// Write a table under the sandbox root and describe the result.
pub fn save_table(
    data_dir: &Path,
    df: &DataFrame,
    relative_path: &str,
    format: ExportFormat,
    options: &SaveOptions,
) -> Result<SaveReceipt> {
    let full_path = resolve_sandboxed(data_dir, relative_path)?;
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => write_csv(df, &full_path, options)?,
        ExportFormat::Excel => write_xlsx(df, &full_path, options)?,
    }

    let byte_size = fs::metadata(&full_path)?.len();
    tracing::debug!(path = %full_path.display(), byte_size, "table exported");

    Ok(SaveReceipt {
        path: relative_path.to_string(),
        format,
        byte_size,
        saved_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn write_csv(df: &DataFrame, path: &Path, options: &SaveOptions) -> Result<()> {
    let mut out = df.clone();
    let mut file = fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(options.include_header.unwrap_or(true))
        .with_separator(options.separator.unwrap_or(',') as u8)
        .finish(&mut out)?;
    Ok(())
}

fn write_xlsx(df: &DataFrame, path: &Path, options: &SaveOptions) -> Result<()> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(options.sheet_name.as_deref().unwrap_or("Sheet1"))?;

    let include_header = options.include_header.unwrap_or(true);
    let mut row_offset = 0u32;
    if include_header {
        for (idx, column) in df.get_columns().iter().enumerate() {
            sheet.write_string(0, idx as u16, column.name().as_str())?;
        }
        row_offset = 1;
    }

    for (idx, column) in df.get_columns().iter().enumerate() {
        let col = idx as u16;
        for row in 0..column.len() {
            let cell = match column.get(row) {
                Ok(value) => any_value_to_json(&value),
                Err(_) => serde_json::Value::Null,
            };
            let target = row_offset + row as u32;
            match cell {
                serde_json::Value::Null => {}
                serde_json::Value::Bool(b) => {
                    sheet.write_boolean(target, col, b)?;
                }
                serde_json::Value::Number(n) => {
                    sheet.write_number(target, col, n.as_f64().unwrap_or(0.0))?;
                }
                serde_json::Value::String(s) => {
                    sheet.write_string(target, col, &s)?;
                }
                other => {
                    sheet.write_string(target, col, &other.to_string())?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> DataFrame {
        df!(
            "name" => ["a", "b"],
            "value" => [1i64, 2],
        )
        .expect("valid sample frame")
    }

    #[test]
    fn test_csv_export_writes_file() {
        let temp = TempDir::new().unwrap();
        let receipt = save_table(
            temp.path(),
            &sample(),
            "out/table.csv",
            ExportFormat::Csv,
            &SaveOptions::default(),
        )
        .unwrap();

        assert_eq!(receipt.format, ExportFormat::Csv);
        assert!(receipt.byte_size > 0);
        let written = fs::read_to_string(temp.path().join("out/table.csv")).unwrap();
        assert!(written.starts_with("name,value"));
    }

    #[test]
    fn test_csv_export_respects_options() {
        let temp = TempDir::new().unwrap();
        let options = SaveOptions {
            include_header: Some(false),
            separator: Some(';'),
            sheet_name: None,
        };
        save_table(
            temp.path(),
            &sample(),
            "bare.csv",
            ExportFormat::Csv,
            &options,
        )
        .unwrap();

        let written = fs::read_to_string(temp.path().join("bare.csv")).unwrap();
        assert!(written.starts_with("a;1"));
    }

    #[test]
    fn test_xlsx_export_writes_file() {
        let temp = TempDir::new().unwrap();
        let receipt = save_table(
            temp.path(),
            &sample(),
            "table.xlsx",
            ExportFormat::Excel,
            &SaveOptions::default(),
        )
        .unwrap();

        assert_eq!(receipt.format, ExportFormat::Excel);
        assert!(temp.path().join("table.xlsx").exists());
    }

    #[test]
    fn test_traversal_is_rejected_before_write() {
        let temp = TempDir::new().unwrap();
        let result = save_table(
            temp.path(),
            &sample(),
            "../../etc/passwd",
            ExportFormat::Csv,
            &SaveOptions::default(),
        );
        assert!(matches!(result, Err(Error::PathEscapesSandbox { .. })));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "XLSX".parse::<ExportFormat>().unwrap(),
            ExportFormat::Excel
        );
        assert!("parquet".parse::<ExportFormat>().is_err());
    }
}
