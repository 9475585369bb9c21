//! File-backed object store.
//!
//! Nodes live in memory and are written to a JSON state file on every
//! [`ObjectStore::flush`], so the mirrored tree survives restarts and can be
//! inspected with `unraid-mirror status`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::{DisplayMetadata, MemoryStore, NodeInfo, NodeKind, ObjectStore, StoredNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// On-disk layout of the state file
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    saved_at: DateTime<Utc>,
    #[serde(default)]
    nodes: BTreeMap<String, StoredNode>,
}

/// An object store persisted as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    nodes: MemoryStore,
}

impl JsonFileStore {
    /// Load the store at `path`, or start empty if the file doesn't exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self {
                path,
                nodes: MemoryStore::new(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!(
            "Loaded {} nodes from {} (saved {})",
            state.nodes.len(),
            path.display(),
            state.saved_at
        );
        Ok(Self {
            path,
            nodes: MemoryStore::from_nodes(state.nodes),
        })
    }

    /// A copy of every node.
    pub fn snapshot(&self) -> BTreeMap<String, StoredNode> {
        self.nodes.snapshot()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let state = StateFile {
            saved_at: Utc::now(),
            nodes: self.nodes.snapshot(),
        };
        let content = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;

        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

impl ObjectStore for JsonFileStore {
    fn create_node_if_absent(
        &self,
        id: &str,
        kind: NodeKind,
        meta: &DisplayMetadata,
    ) -> reconcile::Result<bool> {
        self.nodes.create_node_if_absent(id, kind, meta)
    }

    fn set_node_metadata(&self, id: &str, meta: &DisplayMetadata) -> reconcile::Result<()> {
        self.nodes.set_node_metadata(id, meta)
    }

    fn write_value(&self, id: &str, value: Value) -> reconcile::Result<()> {
        self.nodes.write_value(id, value)
    }

    fn delete_subtree(&self, id: &str) -> reconcile::Result<usize> {
        self.nodes.delete_subtree(id)
    }

    fn list_nodes(&self) -> reconcile::Result<BTreeMap<String, NodeInfo>> {
        self.nodes.list_nodes()
    }

    fn node_info(&self, id: &str) -> reconcile::Result<Option<NodeInfo>> {
        self.nodes.node_info(id)
    }

    fn read_value(&self, id: &str) -> reconcile::Result<Option<Value>> {
        self.nodes.read_value(id)
    }

    fn flush(&self) -> reconcile::Result<()> {
        self.save().map_err(|e| {
            reconcile::Error::store("flush", self.path.display().to_string(), format!("{e:#}"))
        })
    }
}
