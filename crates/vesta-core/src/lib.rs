//! Core engine for Vesta, an interactive data-notebook backend.
//!
//! This crate provides:
//! - Multi-session script execution with persistent namespaces
//! - Console output and graphic capture per call
//! - Tabular variable discovery, introspection and export
//! - Snapshot-ready conversion of session bindings

pub mod error;
pub mod execute;
pub mod figure;
pub mod paths;
pub mod script;
pub mod vars;

pub use error::{Error, Result};
pub use execute::{
    ExecError, ExecStatus, ExecutionResult, SessionEnvironment, SessionHandle, SessionRegistry,
};
pub use figure::{Chart, Figure};
pub use paths::WorkspaceDirs;
pub use script::Frame;
pub use vars::{
    ColumnInfo, ColumnStats, ExportFormat, PersistedValue, SaveOptions, SaveReceipt, TableInfo,
    VariableRegistry,
};
