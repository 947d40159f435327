//! Per-session execution environment.
//!
//! One environment owns a session's engine, scope, capture slots and
//! variable registry. The scope is used for every call, which is what makes
//! top-level bindings from one call visible to the next.

use rhai::{Engine, Scope};
use rustc_hash::FxHashMap;

use crate::execute::capture::{GraphicSlot, OutputBuffer};
use crate::execute::result::{ExecError, ExecStatus, ExecutionResult};
use crate::paths::WorkspaceDirs;
use crate::script::{Frame, build_engine};
use crate::vars::{PersistedValue, VariableRegistry};

/// Isolated execution environment for one session.
pub struct SessionEnvironment {
    session_id: String,
    dirs: WorkspaceDirs,
    engine: Engine,
    scope: Scope<'static>,
    output: OutputBuffer,
    graphics: GraphicSlot,
    vars: VariableRegistry,
}

impl SessionEnvironment {
    /// Build a fresh environment with preset bindings and both show hooks
    /// installed.
    pub fn new(session_id: impl Into<String>, dirs: WorkspaceDirs) -> Self {
        let session_id = session_id.into();
        let (engine, output, graphics) = build_engine(&dirs);
        let vars = VariableRegistry::new(dirs.data_dir.clone());
        tracing::debug!(%session_id, "session environment created");

        Self {
            session_id,
            dirs,
            engine,
            scope: Scope::new(),
            output,
            graphics,
            vars,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn vars(&self) -> &VariableRegistry {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableRegistry {
        &mut self.vars
    }

    /// Execute a snippet against the persistent scope.
    ///
    /// The capture buffer and pending-graphic slot are drained on every exit
    /// path. A script failure is data, not an `Err`: bindings made before
    /// the failure stay bound and the formatted trace is appended to
    /// whatever output was already flushed.
    pub fn execute(&mut self, code: &str) -> ExecutionResult {
        let run = self.engine.run_with_scope(&mut self.scope, code);

        self.refresh_tabular_bindings();
        let mut output = self.output.take();
        let (raster_artifact, interactive_artifact) = self.drain_graphics();
        let has_tabular_variables = !self.vars.is_empty();

        match run {
            Ok(()) => ExecutionResult {
                status: ExecStatus::Success,
                output,
                error: None,
                has_tabular_variables,
                raster_artifact,
                interactive_artifact,
            },
            Err(err) => {
                let error = ExecError::from_eval(code, &err);
                tracing::debug!(
                    session_id = %self.session_id,
                    kind = %error.kind,
                    "script failed"
                );
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&error.trace);
                ExecutionResult {
                    status: ExecStatus::Error,
                    output,
                    error: Some(error),
                    has_tabular_variables,
                    raster_artifact,
                    interactive_artifact,
                }
            }
        }
    }

    /// Discard all user state and rebuild presets and hooks.
    pub fn reset(&mut self) {
        let (engine, output, graphics) = build_engine(&self.dirs);
        self.engine = engine;
        self.output = output;
        self.graphics = graphics;
        self.scope = Scope::new();
        self.vars.clear();
        tracing::debug!(session_id = %self.session_id, "session environment reset");
    }

    /// Merge restored bindings into the scope, registering tables.
    pub fn set_bindings(&mut self, bindings: FxHashMap<String, PersistedValue>) {
        for (name, value) in bindings {
            match value {
                PersistedValue::Table(df) => {
                    self.vars.register(&name, df.clone());
                    self.scope.set_value(name, Frame(df));
                }
                PersistedValue::Data(json) => match rhai::serde::to_dynamic(&json) {
                    Ok(value) => {
                        self.scope.set_value(name, value);
                    }
                    Err(e) => {
                        tracing::warn!(
                            session_id = %self.session_id,
                            %name,
                            "binding not restorable: {e}"
                        );
                    }
                },
            }
        }
    }

    /// Convert current scope bindings into snapshot form.
    ///
    /// Bindings with no persistable form (figures, charts, closures) are
    /// skipped and their names returned alongside the survivors.
    pub fn exportable_bindings(&self) -> (FxHashMap<String, PersistedValue>, Vec<String>) {
        let mut bindings = FxHashMap::default();
        let mut skipped = Vec::new();

        for (name, _, value) in self.scope.iter() {
            if value.is::<Frame>() {
                let frame = value.cast::<Frame>();
                bindings.insert(name.to_string(), PersistedValue::Table(frame.0));
            } else {
                match rhai::serde::from_dynamic::<serde_json::Value>(&value) {
                    Ok(json) => {
                        bindings.insert(name.to_string(), PersistedValue::Data(json));
                    }
                    Err(_) => skipped.push(name.to_string()),
                }
            }
        }

        (bindings, skipped)
    }

    /// Re-scan the scope and (re)register every tabular binding.
    fn refresh_tabular_bindings(&mut self) {
        let frames: Vec<(String, Frame)> = self
            .scope
            .iter()
            .filter_map(|(name, _, value)| {
                value
                    .try_cast::<Frame>()
                    .map(|frame| (name.to_string(), frame))
            })
            .collect();
        for (name, frame) in frames {
            self.vars.register(&name, frame.0);
        }
    }

    /// Render and clear the pending graphics captured by the show hooks.
    fn drain_graphics(&mut self) -> (Option<String>, Option<String>) {
        let pending = self.graphics.drain();

        let raster = pending.raster.and_then(|figure| match figure.to_markup() {
            Ok(markup) => Some(markup),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "figure render failed: {e}");
                None
            }
        });

        let interactive = pending
            .interactive
            .and_then(|chart| match chart.to_markup() {
                Ok(markup) => Some(markup),
                Err(e) => {
                    tracing::warn!(session_id = %self.session_id, "chart render failed: {e}");
                    None
                }
            });

        (raster, interactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn environment(temp: &TempDir) -> SessionEnvironment {
        let dirs = WorkspaceDirs::from_root(temp.path()).expect("workspace dirs");
        SessionEnvironment::new("test-session", dirs)
    }

    #[test]
    fn test_bindings_persist_across_calls() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        assert!(env.execute("let x = 1;").is_success());
        let result = env.execute("print(x)");
        assert!(result.is_success());
        assert_eq!(result.output, "1\n");
    }

    #[test]
    fn test_error_preserves_flushed_output_and_bindings() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let result = env.execute("let a = 5; print(\"before\"); missing_fn();");
        assert_eq!(result.status, ExecStatus::Error);
        let error = result.error.expect("structured error");
        assert_eq!(error.kind, "function not found");
        assert!(result.output.starts_with("before\n"));
        assert!(result.output.contains("function not found"));

        // The binding made before the failure survives.
        let after = env.execute("print(a)");
        assert!(after.is_success());
        assert_eq!(after.output, "5\n");
    }

    #[test]
    fn test_reset_clears_user_bindings() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        env.execute("let x = 1;");
        env.reset();
        let result = env.execute("print(x)");
        assert_eq!(result.status, ExecStatus::Error);
        assert_eq!(result.error.map(|e| e.kind).as_deref(), Some("variable not found"));
    }

    #[test]
    fn test_reset_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        env.execute("let t = table(#{\"a\": [1, 2]});");
        env.reset();
        env.reset();
        assert!(env.vars().is_empty());
        assert!(env.execute("print(\"ok\")").is_success());
    }

    #[test]
    fn test_tabular_binding_is_registered() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let result = env.execute("let t = table(#{\"a\": [1, 2]});");
        assert!(result.is_success());
        assert!(result.has_tabular_variables);
        assert_eq!(env.vars().list_names(), vec!["t".to_string()]);
    }

    #[test]
    fn test_raster_capture_and_slot_drained() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let result = env.execute(
            "let fig = figure(); fig.line([0.0, 1.0], [0.0, 1.0]); fig.show();",
        );
        assert!(result.is_success());
        let artifact = result.raster_artifact.expect("raster artifact");
        assert!(artifact.starts_with("<img src=\"data:image/png;base64,"));

        // The pending slot was consumed; the next call captures nothing.
        let next = env.execute("print(\"no plot\")");
        assert!(next.raster_artifact.is_none());
    }

    #[test]
    fn test_interactive_capture() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let result = env.execute(
            "let c = chart(\"scatter\"); c.trace(\"pts\", [1, 2], [3, 4]); c.show();",
        );
        assert!(result.is_success());
        let artifact = result.interactive_artifact.expect("interactive artifact");
        assert!(artifact.contains("window.Plotly"));
    }

    #[test]
    fn test_figure_without_show_is_not_captured() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let result = env.execute("let fig = figure(); fig.line([0.0, 1.0], [0.0, 1.0]);");
        assert!(result.is_success());
        assert!(result.raster_artifact.is_none());
    }

    #[test]
    fn test_export_skips_unserializable_bindings() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        env.execute("let x = 5; let fig = figure();");
        let (bindings, skipped) = env.exportable_bindings();

        assert!(bindings.contains_key("x"));
        assert_eq!(skipped, vec!["fig".to_string()]);
    }

    #[test]
    fn test_set_bindings_restores_scalars_and_tables() {
        let temp = TempDir::new().unwrap();
        let mut env = environment(&temp);

        let mut bindings = FxHashMap::default();
        bindings.insert(
            "x".to_string(),
            PersistedValue::Data(serde_json::json!(5)),
        );
        bindings.insert(
            "t".to_string(),
            PersistedValue::Table(polars::df!("a" => [1i64, 2]).unwrap()),
        );
        env.set_bindings(bindings);

        let result = env.execute("print(x); print(t.nrows());");
        assert!(result.is_success());
        assert_eq!(result.output, "5\n2\n");
        assert!(env.vars().list_names().contains(&"t".to_string()));
    }
}
