//! Structured results for session code execution.

use rhai::EvalAltResult;
use serde::{Deserialize, Serialize};

/// Outcome of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Success,
    Error,
}

/// Structured description of a script failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecError {
    /// Coarse failure category (`parse error`, `variable not found`, ...).
    pub kind: String,
    /// Human-readable message from the engine.
    pub message: String,
    /// Formatted trace including position and the offending source line.
    pub trace: String,
}

/// Result of executing one snippet in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecStatus,
    /// Captured console output; on failure the trace is appended after any
    /// output that was already flushed.
    pub output: String,
    pub error: Option<ExecError>,
    /// Whether the session currently has registered tabular variables.
    pub has_tabular_variables: bool,
    /// Embeddable `<img>` markup for a captured raster figure.
    pub raster_artifact: Option<String>,
    /// Embeddable runtime-lookup markup for a captured interactive chart.
    pub interactive_artifact: Option<String>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecStatus::Success
    }
}

fn classify(err: &EvalAltResult) -> &'static str {
    use EvalAltResult::*;
    match err {
        ErrorParsing(..) => "parse error",
        ErrorVariableNotFound(..) => "variable not found",
        ErrorFunctionNotFound(..) => "function not found",
        ErrorMismatchDataType(..) | ErrorMismatchOutputType(..) => "type mismatch",
        ErrorIndexingType(..) | ErrorArrayBounds(..) | ErrorStringBounds(..) => "index error",
        ErrorArithmetic(..) => "arithmetic error",
        ErrorRuntime(..) => "runtime error",
        _ => "evaluation error",
    }
}

impl ExecError {
    /// Build a structured error from an engine failure.
    pub fn from_eval(code: &str, err: &EvalAltResult) -> Self {
        let kind = classify(err).to_string();
        let message = err.to_string();

        let mut trace = format!("{kind}: {message}");
        let pos = err.position();
        if let Some(line) = pos.line() {
            trace.push_str(&format!("\n  --> line {line}"));
            if let Some(column) = pos.position() {
                trace.push_str(&format!(", column {column}"));
            }
            if let Some(source) = code.lines().nth(line.saturating_sub(1)) {
                trace.push_str(&format!("\n   | {}", source.trim_end()));
            }
        }

        Self {
            kind,
            message,
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variable_classified() {
        let engine = rhai::Engine::new();
        let code = "print(missing)";
        let err = engine.run(code).expect_err("should fail");
        let exec = ExecError::from_eval(code, &err);

        assert_eq!(exec.kind, "variable not found");
        assert!(exec.message.contains("missing"));
        assert!(exec.trace.contains("line 1"));
        assert!(exec.trace.contains("print(missing)"));
    }

    #[test]
    fn test_parse_error_classified() {
        let engine = rhai::Engine::new();
        let err = engine.run("let = ;").expect_err("should fail");
        let exec = ExecError::from_eval("let = ;", &err);
        assert_eq!(exec.kind, "parse error");
    }
}
