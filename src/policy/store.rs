//! Durable storage for the action-value table.
//!
//! Policy logic is decoupled from the storage mechanism: the agent talks
//! to a [`PolicyStore`] with load-at-init / save-after-update semantics,
//! and implementations decide where the bytes go.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use super::QTable;

/// Durable key-value slot for the action-value table.
pub trait PolicyStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<QTable>>;
    fn save(&self, table: &QTable) -> Result<()>;
}

/// JSON file persistence, shape `{state: {action: value}}`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PolicyStore for JsonFileStore {
    fn load(&self) -> Result<Option<QTable>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading policy table {}", self.path.display()))?;
        let table = serde_json::from_str(&text)
            .with_context(|| format!("parsing policy table {}", self.path.display()))?;
        Ok(Some(table))
    }

    fn save(&self, table: &QTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing policy table {}", self.path.display()))
    }
}

/// In-memory store, for tests and ephemeral deployments. Clones share the
/// same slot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyStore for MemoryStore {
    fn load(&self) -> Result<Option<QTable>> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, table: &QTable) -> Result<()> {
        let text = serde_json::to_string(table)?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::AffectiveState;
    use crate::policy::{Action, ActionValues};

    fn sample_table() -> QTable {
        let mut row = ActionValues::default();
        row.set(Action::Hint, 0.1);
        let mut table = QTable::new();
        table.insert(AffectiveState::Struggling, row);
        table
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("rl_model.json"));

        assert!(store.load().unwrap().is_none());
        store.save(&sample_table()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_table()));
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/data/rl_model.json"));
        store.save(&sample_table()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn file_shape_matches_original_model_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rl_model.json");
        JsonFileStore::new(&path).save(&sample_table()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["struggling"]["hint"], 0.1);
        assert_eq!(raw["struggling"]["easier_problem"], 0.0);
    }

    #[test]
    fn memory_store_shares_slot_across_clones() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.save(&sample_table()).unwrap();
        assert_eq!(clone.load().unwrap(), Some(sample_table()));
    }
}
