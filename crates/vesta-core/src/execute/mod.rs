//! Session execution.
//!
//! This module provides:
//! - Per-session environments with persistent scopes
//! - Console and graphic capture around each call
//! - The registry that maps session ids to live environments

pub mod capture;
mod environment;
mod result;
mod sessions;

pub use capture::{GraphicSlot, OutputBuffer, PendingGraphic};
pub use environment::SessionEnvironment;
pub use result::{ExecError, ExecStatus, ExecutionResult};
pub use sessions::{SessionHandle, SessionRegistry};
