//! Integration tests for multi-session execution.
//!
//! Exercises the full path: registry → environment → capture → variables.

use tempfile::TempDir;
use vesta_core::{ExportFormat, SaveOptions, SessionRegistry};

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a temporary workspace-backed registry.
fn registry() -> (TempDir, SessionRegistry) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let reg = SessionRegistry::with_root(temp.path()).expect("Failed to create registry");
    (temp, reg)
}

// =============================================================================
// Namespace Persistence and Isolation
// =============================================================================

#[test]
fn test_namespace_persists_across_calls() {
    let (_temp, reg) = registry();

    assert!(reg.execute("s1", "let x = 1;").is_success());
    let result = reg.execute("s1", "print(x)");
    assert!(result.is_success());
    assert_eq!(result.output, "1\n");
}

#[test]
fn test_sessions_do_not_share_bindings() {
    let (_temp, reg) = registry();

    reg.execute("alpha", "let x = 1;");
    let result = reg.execute("beta", "print(x)");

    assert!(!result.is_success());
    let error = result.error.expect("structured error");
    assert_eq!(error.kind, "variable not found");
    assert!(error.trace.contains("print(x)"));
}

#[test]
fn test_reset_is_idempotent() {
    let (_temp, reg) = registry();

    reg.execute("s1", "let t = table(#{\"a\": [1]}); let x = 2;");
    reg.reset_session("s1");
    reg.reset_session("s1");

    assert!(reg.list_variables("s1").is_empty());
    assert!(!reg.execute("s1", "print(x)").is_success());
}

#[test]
fn test_partial_failure_keeps_earlier_bindings() {
    let (_temp, reg) = registry();

    let result = reg.execute("s1", "let kept = 41; nonsense();");
    assert!(!result.is_success());

    let after = reg.execute("s1", "print(kept + 1)");
    assert!(after.is_success());
    assert_eq!(after.output, "42\n");
}

// =============================================================================
// Tabular Variables
// =============================================================================

#[test]
fn test_tabular_registration_and_info() {
    let (_temp, reg) = registry();

    let result = reg.execute("s1", "let t = table(#{\"a\": [1, 2]});");
    assert!(result.is_success());
    assert!(result.has_tabular_variables);
    assert_eq!(reg.list_variables("s1"), vec!["t".to_string()]);

    let info = reg.get_variable_info("s1", "t").expect("table info");
    assert_eq!(info.row_count, 2);
    assert_eq!(info.column_count, 1);
    assert_eq!(info.columns[0].name, "a");
}

#[test]
fn test_rebinding_refreshes_info() {
    let (_temp, reg) = registry();

    reg.execute("s1", "let t = table(#{\"a\": [1, 2]});");
    reg.execute("s1", "t = table(#{\"a\": [1, 2, 3], \"b\": [1.0, 2.0, 3.0]});");

    let info = reg.get_variable_info("s1", "t").expect("table info");
    assert_eq!(info.row_count, 3);
    assert_eq!(info.column_count, 2);
    assert!(info.summary.contains_key("b"));
}

#[test]
fn test_nan_never_crosses_boundary() {
    let (_temp, reg) = registry();

    reg.execute("s1", "let t = table(#{\"v\": [1.0, 0.0 / 0.0]});");
    let info = reg.get_variable_info("s1", "t").expect("table info");

    let serialized = serde_json::to_string(&info).expect("info serializes");
    assert!(!serialized.contains("NaN"));
    assert_eq!(info.head[1]["v"], serde_json::Value::Null);
}

#[test]
fn test_save_variable_is_sandboxed() {
    let (temp, reg) = registry();

    reg.execute("s1", "let t = table(#{\"a\": [1, 2]});");
    let result = reg.save_variable_to_file(
        "s1",
        "t",
        "../../etc/passwd",
        ExportFormat::Csv,
        &SaveOptions::default(),
    );
    assert!(result.is_err());

    // A one-level escape out of the data sandbox is rejected before any
    // write happens.
    let result = reg.save_variable_to_file(
        "s1",
        "t",
        "../escaped.csv",
        ExportFormat::Csv,
        &SaveOptions::default(),
    );
    assert!(result.is_err());
    assert!(!temp.path().join("escaped.csv").exists());
}

#[test]
fn test_save_variable_writes_inside_sandbox() {
    let (temp, reg) = registry();

    reg.execute("s1", "let t = table(#{\"a\": [1, 2]});");
    let receipt = reg
        .save_variable_to_file(
            "s1",
            "t",
            "exports/t.csv",
            ExportFormat::Csv,
            &SaveOptions::default(),
        )
        .expect("save succeeds");

    assert!(receipt.byte_size > 0);
    assert!(!receipt.saved_at.is_empty());
    assert!(temp.path().join("data/exports/t.csv").exists());
}

// =============================================================================
// Graphic Capture
// =============================================================================

#[test]
fn test_raster_capture_once_per_show() {
    let (_temp, reg) = registry();

    let result = reg.execute(
        "s1",
        "let fig = figure();\n\
         fig.line(num::linspace(0, 6, 20), num::linspace(0, 3, 20));\n\
         fig.show();",
    );
    assert!(result.is_success());
    assert!(
        result
            .raster_artifact
            .as_deref()
            .is_some_and(|m| m.starts_with("<img src=\"data:image/png;base64,"))
    );

    // Slot drained: a plain call afterwards carries no artifact.
    let next = reg.execute("s1", "print(\"nothing\")");
    assert!(next.raster_artifact.is_none());
    assert!(next.interactive_artifact.is_none());
}

#[test]
fn test_last_shown_figure_wins() {
    let (_temp, reg) = registry();

    let result = reg.execute(
        "s1",
        "let a = figure(); a.title(\"first\"); a.bar([1.0, 2.0]); a.show();\n\
         let b = figure(); b.title(\"second\"); b.scatter([1.0], [2.0]); b.show();",
    );
    assert!(result.is_success());
    // One artifact only, produced from the second figure.
    assert!(result.raster_artifact.is_some());
}

#[test]
fn test_interactive_capture_emits_runtime_fragment() {
    let (_temp, reg) = registry();

    let result = reg.execute(
        "s1",
        "let c = chart(\"bar\");\n\
         c.trace(\"t\", [\"a\", \"b\"], [3, 4]);\n\
         c.title(\"demo\");\n\
         c.show();",
    );
    assert!(result.is_success());
    let markup = result.interactive_artifact.expect("chart artifact");
    assert!(markup.contains("window.Plotly"));
    assert!(markup.contains("\"demo\""));
}
