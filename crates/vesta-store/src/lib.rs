//! Durable session snapshots.
//!
//! A snapshot is one blob of a session's serializable bindings, keyed to
//! the owning notebook document by a fixed filename mapping (`analysis.note`
//! → `analysis.snap`). The store lives beside the live sessions and never
//! touches them: notebook storage pulls bindings out of a session when it
//! saves a document, and pushes them back in when it loads one.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use vesta_core::PersistedValue;

pub use error::{StoreError, StoreResult};

/// Bindings as they travel between the engine and the store.
pub type BindingSet = FxHashMap<String, PersistedValue>;

/// Outcome of writing one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReceipt {
    /// Path of the written blob.
    pub path: PathBuf,
    /// Names that survived the serialization probe, in written order.
    pub written: Vec<String>,
    /// Names dropped because they failed the round-trip probe.
    pub dropped: Vec<String>,
    /// Size of the blob in bytes.
    pub byte_size: u64,
}

/// Store for persisted session environments.
pub struct SnapshotStore {
    snapshot_dir: PathBuf,
}

impl SnapshotStore {
    /// Open a store rooted at a snapshot directory, creating it if needed.
    pub fn new(snapshot_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    /// The fixed, reversible notebook → snapshot filename mapping.
    ///
    /// The notebook file's extension is replaced by `.snap`; a notebook
    /// name without an extension gains one.
    fn snapshot_path(&self, notebook_name: &str) -> PathBuf {
        let stem = Path::new(notebook_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(notebook_name);
        self.snapshot_dir.join(format!("{stem}.snap"))
    }

    /// Write a session's bindings as the snapshot for `notebook_name`.
    ///
    /// Every binding is probed with an encode→decode round-trip first;
    /// bindings that fail the probe are dropped from the blob, and their
    /// names are reported in the receipt.
    pub fn save(&self, notebook_name: &str, bindings: &BindingSet) -> StoreResult<SnapshotReceipt> {
        let mut survivors: FxHashMap<&str, &PersistedValue> = FxHashMap::default();
        let mut written = Vec::new();
        let mut dropped = Vec::new();

        for (name, value) in bindings {
            let round_trip = serde_json::to_vec(value)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<PersistedValue>(&bytes).ok());
            match round_trip {
                Some(_) => {
                    survivors.insert(name.as_str(), value);
                    written.push(name.clone());
                }
                None => {
                    tracing::debug!(notebook_name, name, "binding dropped from snapshot");
                    dropped.push(name.clone());
                }
            }
        }

        let path = self.snapshot_path(notebook_name);
        let blob = serde_json::to_vec(&survivors)?;
        fs::write(&path, &blob).map_err(|e| StoreError::Write {
            path: path.clone(),
            message: e.to_string(),
        })?;

        written.sort();
        dropped.sort();
        tracing::debug!(
            notebook_name,
            written = written.len(),
            dropped = dropped.len(),
            "snapshot written"
        );

        Ok(SnapshotReceipt {
            path,
            written,
            dropped,
            byte_size: blob.len() as u64,
        })
    }

    /// Load the snapshot for `notebook_name`.
    ///
    /// A missing or undecodable snapshot loads as an empty binding set —
    /// this path never fails.
    pub fn load(&self, notebook_name: &str) -> BindingSet {
        let path = self.snapshot_path(notebook_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return BindingSet::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(bindings) => bindings,
            Err(e) => {
                tracing::warn!(notebook_name, "snapshot undecodable, loading empty: {e}");
                BindingSet::default()
            }
        }
    }

    /// Remove the snapshot for a deleted notebook. No-op when absent.
    pub fn delete(&self, notebook_name: &str) -> StoreResult<()> {
        let path = self.snapshot_path(notebook_name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Move a snapshot alongside a notebook rename. No-op when absent.
    pub fn rename(&self, old_name: &str, new_name: &str) -> StoreResult<()> {
        let old_path = self.snapshot_path(old_name);
        if old_path.exists() {
            fs::rename(&old_path, self.snapshot_path(new_name))?;
        }
        Ok(())
    }
}
