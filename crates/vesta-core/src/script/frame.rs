//! Tabular presets for session code.
//!
//! `Frame` is the script-side handle for a table; the namespace re-scan
//! after each call looks for exactly this type. Constructors are available
//! both globally (`table`, `read_csv`) and under the `tab` module alias.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Module};

use super::{script_err, to_f64};
use crate::paths::resolve_sandboxed;

/// Script-side handle for a table value.
#[derive(Debug, Clone)]
pub struct Frame(pub DataFrame);

/// Register the tabular presets on a session engine.
pub fn register(engine: &mut Engine, data_dir: PathBuf) {
    engine.register_type_with_name::<Frame>("Frame");

    engine.register_fn("table", table_from_map);
    let dir = data_dir.clone();
    engine.register_fn("read_csv", move |path: ImmutableString| {
        read_csv_impl(&dir, &path)
    });

    engine.register_fn("to_string", |f: &mut Frame| f.0.to_string());
    engine.register_fn("to_debug", |f: &mut Frame| f.0.to_string());
    engine.register_fn("nrows", |f: &mut Frame| f.0.height() as i64);
    engine.register_fn("ncols", |f: &mut Frame| f.0.width() as i64);
    engine.register_fn("columns", |f: &mut Frame| {
        f.0.get_column_names()
            .into_iter()
            .map(|n| Dynamic::from(n.to_string()))
            .collect::<Array>()
    });
    engine.register_fn("head", |f: &mut Frame, n: i64| {
        Frame(f.0.head(Some(n.max(0) as usize)))
    });
    engine.register_fn("tail", |f: &mut Frame, n: i64| {
        Frame(f.0.tail(Some(n.max(0) as usize)))
    });
    engine.register_fn(
        "select",
        |f: &mut Frame, names: Array| -> Result<Frame, Box<EvalAltResult>> {
            let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
            let selected = f
                .0
                .select(names)
                .map_err(|e| script_err(format!("select: {e}")))?;
            Ok(Frame(selected))
        },
    );
    engine.register_fn(
        "col",
        |f: &mut Frame, name: ImmutableString| -> Result<Array, Box<EvalAltResult>> {
            let column = f
                .0
                .column(name.as_str())
                .map_err(|e| script_err(format!("col: {e}")))?;
            let mut values = Array::with_capacity(column.len());
            for row in 0..column.len() {
                let cell = column
                    .get(row)
                    .map_err(|e| script_err(format!("col: {e}")))?;
                values.push(any_value_to_dynamic(&cell));
            }
            Ok(values)
        },
    );

    let mut tab = Module::new();
    tab.set_native_fn("table", table_from_map);
    let dir = data_dir;
    tab.set_native_fn("read_csv", move |path: ImmutableString| {
        read_csv_impl(&dir, &path)
    });
    engine.register_static_module("tab", tab.into());
}

fn any_value_to_dynamic(value: &AnyValue) -> Dynamic {
    match value {
        AnyValue::Null => Dynamic::UNIT,
        AnyValue::Boolean(b) => (*b).into(),
        AnyValue::Int8(v) => Dynamic::from_int(*v as i64),
        AnyValue::Int16(v) => Dynamic::from_int(*v as i64),
        AnyValue::Int32(v) => Dynamic::from_int(*v as i64),
        AnyValue::Int64(v) => Dynamic::from_int(*v),
        AnyValue::UInt8(v) => Dynamic::from_int(*v as i64),
        AnyValue::UInt16(v) => Dynamic::from_int(*v as i64),
        AnyValue::UInt32(v) => Dynamic::from_int(*v as i64),
        AnyValue::UInt64(v) => Dynamic::from_int(*v as i64),
        AnyValue::Float32(v) => Dynamic::from_float(*v as f64),
        AnyValue::Float64(v) => Dynamic::from_float(*v),
        AnyValue::String(s) => Dynamic::from((*s).to_string()),
        AnyValue::StringOwned(s) => Dynamic::from(s.to_string()),
        other => Dynamic::from(other.to_string()),
    }
}

/// Build a table from a `#{ column: [values] }` map.
fn table_from_map(entries: Map) -> Result<Frame, Box<EvalAltResult>> {
    let mut columns = Vec::with_capacity(entries.len());
    for (name, value) in entries {
        let cells = value
            .try_cast::<Array>()
            .ok_or_else(|| script_err(format!("table: column '{name}' must be an array")))?;
        columns.push(column_from_array(name.as_str(), &cells)?);
    }
    let df = DataFrame::new(columns).map_err(|e| script_err(format!("table: {e}")))?;
    Ok(Frame(df))
}

/// Infer a column dtype from script values. Unit entries become nulls.
fn column_from_array(name: &str, cells: &Array) -> Result<Column, Box<EvalAltResult>> {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_str = false;
    let mut has_bool = false;

    for cell in cells {
        if cell.is_unit() {
            continue;
        } else if cell.is::<i64>() {
            has_int = true;
        } else if cell.is::<f64>() {
            has_float = true;
        } else if cell.is::<ImmutableString>() {
            has_str = true;
        } else if cell.is::<bool>() {
            has_bool = true;
        } else {
            return Err(script_err(format!(
                "table: column '{name}' has unsupported value type {}",
                cell.type_name()
            )));
        }
    }

    let mixed = [has_int || has_float, has_str, has_bool]
        .iter()
        .filter(|&&present| present)
        .count()
        > 1;
    if mixed {
        return Err(script_err(format!(
            "table: column '{name}' mixes incompatible value types"
        )));
    }

    let series = if has_str {
        let mut values: Vec<Option<String>> = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.is_unit() {
                values.push(None);
            } else {
                values.push(Some(cell.clone().into_string().map_err(|t| {
                    script_err(format!("table: column '{name}' expected string, found {t}"))
                })?));
            }
        }
        Series::new(name.into(), values)
    } else if has_bool {
        let mut values: Vec<Option<bool>> = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.is_unit() {
                values.push(None);
            } else {
                values.push(Some(cell.as_bool().map_err(|t| {
                    script_err(format!("table: column '{name}' expected bool, found {t}"))
                })?));
            }
        }
        Series::new(name.into(), values)
    } else if has_float {
        let mut values: Vec<Option<f64>> = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.is_unit() {
                values.push(None);
            } else {
                values.push(Some(to_f64(cell)?));
            }
        }
        Series::new(name.into(), values)
    } else {
        // Int column; also covers the all-null case.
        let mut values: Vec<Option<i64>> = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.is_unit() {
                values.push(None);
            } else {
                values.push(Some(cell.as_int().map_err(|t| {
                    script_err(format!("table: column '{name}' expected int, found {t}"))
                })?));
            }
        }
        Series::new(name.into(), values)
    };

    Ok(series.into_column())
}

fn read_csv_impl(data_dir: &Path, path: &ImmutableString) -> Result<Frame, Box<EvalAltResult>> {
    let resolved = resolve_sandboxed(data_dir, path.as_str())
        .map_err(|e| script_err(format!("read_csv: {e}")))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(resolved))
        .map_err(|e| script_err(format!("read_csv: {e}")))?
        .finish()
        .map_err(|e| script_err(format!("read_csv: {e}")))?;
    Ok(Frame(df))
}
