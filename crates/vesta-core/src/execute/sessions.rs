//! Session registry.
//!
//! Owns the session_id → environment map. Sessions are created lazily on
//! first use and live until explicitly deleted or the process exits.
//!
//! Calls against different session ids are independent; calls against the
//! same id serialize on the session's own lock, which is held for the full
//! duration of every mutating call. The registry map has its own lock so
//! `get_or_create` and `delete_session` cannot race.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::execute::environment::SessionEnvironment;
use crate::execute::result::ExecutionResult;
use crate::paths::WorkspaceDirs;
use crate::vars::{ExportFormat, PersistedValue, SaveOptions, SaveReceipt, TableInfo};

/// Shared handle to one session's environment.
pub type SessionHandle = Arc<Mutex<SessionEnvironment>>;

/// Registry of all live session environments.
pub struct SessionRegistry {
    dirs: WorkspaceDirs,
    sessions: RwLock<FxHashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(dirs: WorkspaceDirs) -> Self {
        Self {
            dirs,
            sessions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Convenience constructor that also creates the workspace layout.
    pub fn with_root(root: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(WorkspaceDirs::from_root(root)?))
    }

    /// Mint a fresh opaque session id.
    pub fn mint_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Look up a session, creating it lazily.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(session_id) {
            return handle.clone();
        }
        let mut sessions = self.sessions.write();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionEnvironment::new(
                    session_id,
                    self.dirs.clone(),
                )))
            })
            .clone()
    }

    fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Execute a snippet in a session, creating the session if needed.
    pub fn execute(&self, session_id: &str, code: &str) -> ExecutionResult {
        let handle = self.get_or_create(session_id);
        let mut session = handle.lock();
        session.execute(code)
    }

    /// Reset a session in place. No-op for unknown ids.
    pub fn reset_session(&self, session_id: &str) {
        if let Some(handle) = self.get(session_id) {
            handle.lock().reset();
        }
    }

    /// Delete a session, dropping its environment and variable registry
    /// together. No-op for unknown ids.
    pub fn delete_session(&self, session_id: &str) {
        if self.sessions.write().remove(session_id).is_some() {
            tracing::debug!(session_id, "session deleted");
        }
    }

    /// Names of the tabular variables in a session. Empty for unknown ids.
    pub fn list_variables(&self, session_id: &str) -> Vec<String> {
        self.get(session_id)
            .map(|handle| handle.lock().vars().list_names())
            .unwrap_or_default()
    }

    /// The live table bound to `name` in a session. `None` for unknown
    /// session ids or names.
    pub fn get_variable(&self, session_id: &str, name: &str) -> Option<polars::frame::DataFrame> {
        let handle = self.get(session_id)?;
        let session = handle.lock();
        session.vars().get(name).cloned()
    }

    /// Introspection metadata for one tabular variable. `None` for unknown
    /// session ids or names.
    pub fn get_variable_info(&self, session_id: &str, name: &str) -> Option<TableInfo> {
        let handle = self.get(session_id)?;
        let mut session = handle.lock();
        session.vars_mut().get_info(name).cloned()
    }

    /// Export a session's tabular variable to a file under the data sandbox.
    pub fn save_variable_to_file(
        &self,
        session_id: &str,
        name: &str,
        relative_path: &str,
        format: ExportFormat,
        options: &SaveOptions,
    ) -> Result<SaveReceipt> {
        let handle = self
            .get(session_id)
            .ok_or_else(|| crate::error::Error::UnknownVariable(name.to_string()))?;
        let session = handle.lock();
        session.vars().save(name, relative_path, format, options)
    }

    /// Merge restored bindings into a session, creating it if needed.
    pub fn set_bindings(&self, session_id: &str, bindings: FxHashMap<String, PersistedValue>) {
        let handle = self.get_or_create(session_id);
        handle.lock().set_bindings(bindings);
    }

    /// Snapshot-ready bindings of a session plus the names that had no
    /// persistable form. Empty for unknown ids.
    pub fn export_bindings(
        &self,
        session_id: &str,
    ) -> (FxHashMap<String, PersistedValue>, Vec<String>) {
        self.get(session_id)
            .map(|handle| handle.lock().exportable_bindings())
            .unwrap_or_default()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
