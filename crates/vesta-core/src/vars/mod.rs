//! Tabular variable tracking.
//!
//! Each session owns one [`VariableRegistry`]. The engine re-scans the
//! session scope after every call and (re)registers every binding whose
//! current value is a table, so the registry always reflects the live
//! namespace.

mod export;
mod info;
pub mod value;

use std::path::PathBuf;

use polars::frame::DataFrame;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

pub use export::{ExportFormat, SaveOptions, SaveReceipt};
pub use info::{ColumnInfo, ColumnStats, TableInfo};
pub use value::PersistedValue;

/// Registry of the tabular variables bound in one session.
pub struct VariableRegistry {
    /// Sandbox root for exports.
    data_dir: PathBuf,

    /// Live table objects by variable name.
    frames: FxHashMap<String, DataFrame>,

    /// Cached introspection metadata, recomputed on (re)bind.
    info: FxHashMap<String, TableInfo>,
}

impl VariableRegistry {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            frames: FxHashMap::default(),
            info: FxHashMap::default(),
        }
    }

    /// Register a table binding and recompute its metadata.
    pub fn register(&mut self, name: &str, df: DataFrame) {
        self.info.insert(name.to_string(), TableInfo::compute(name, &df));
        self.frames.insert(name.to_string(), df);
    }

    /// The live table bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.frames.get(name)
    }

    /// Introspection metadata for `name`, recomputed lazily when missing.
    pub fn get_info(&mut self, name: &str) -> Option<&TableInfo> {
        if !self.info.contains_key(name) {
            let df = self.frames.get(name)?;
            let computed = TableInfo::compute(name, df);
            self.info.insert(name.to_string(), computed);
        }
        self.info.get(name)
    }

    /// Names of all registered tables.
    pub fn list_names(&self) -> Vec<String> {
        self.frames.keys().cloned().collect()
    }

    /// Full snapshot of the registered tables.
    pub fn get_all(&self) -> &FxHashMap<String, DataFrame> {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop all registered tables and metadata.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.info.clear();
    }

    /// Export a registered table to a file under the data sandbox.
    pub fn save(
        &self,
        name: &str,
        relative_path: &str,
        format: ExportFormat,
        options: &SaveOptions,
    ) -> Result<SaveReceipt> {
        let df = self
            .frames
            .get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;
        export::save_table(&self.data_dir, df, relative_path, format, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn registry(temp: &TempDir) -> VariableRegistry {
        VariableRegistry::new(temp.path().to_path_buf())
    }

    fn sample() -> DataFrame {
        df!("a" => [1i64, 2]).expect("valid sample frame")
    }

    #[test]
    fn test_register_computes_info() {
        let temp = TempDir::new().unwrap();
        let mut vars = registry(&temp);
        vars.register("t", sample());

        assert_eq!(vars.list_names(), vec!["t".to_string()]);
        let info = vars.get_info("t").unwrap();
        assert_eq!(info.row_count, 2);
        assert_eq!(info.column_count, 1);
    }

    #[test]
    fn test_rebind_refreshes_info() {
        let temp = TempDir::new().unwrap();
        let mut vars = registry(&temp);
        vars.register("t", sample());
        vars.register("t", df!("a" => [1i64, 2, 3]).unwrap());

        assert_eq!(vars.get_info("t").unwrap().row_count, 3);
        assert_eq!(vars.list_names().len(), 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let temp = TempDir::new().unwrap();
        let mut vars = registry(&temp);
        vars.register("t", sample());
        vars.clear();

        assert!(vars.is_empty());
        assert!(vars.get_info("t").is_none());
    }

    #[test]
    fn test_save_unknown_name_errors() {
        let temp = TempDir::new().unwrap();
        let vars = registry(&temp);
        let result = vars.save("ghost", "x.csv", ExportFormat::Csv, &SaveOptions::default());
        assert!(matches!(result, Err(Error::UnknownVariable(_))));
    }
}
