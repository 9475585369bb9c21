//! Object store collaborator
//!
//! The mirror writes into a hierarchical store keyed by dot-segmented ids.
//! [`ObjectStore`] is the seam; [`MemoryStore`] is the in-memory
//! implementation used by tests and as the backing map of file-based stores.

use crate::error::{Error, Result};
use crate::id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Kind of node in the object tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Groups other nodes, carries no value
    Container,
    /// Holds one value
    Leaf,
}

/// Type of value a leaf holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    /// Structured value
    Json,
}

/// Human-facing description of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    /// Display label
    pub name: String,
    pub kind: ValueKind,
    /// Role tag (e.g. `value.temperature`, `indicator.running`)
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl DisplayMetadata {
    pub fn new(name: impl Into<String>, kind: ValueKind, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            role: role.into(),
            unit: None,
        }
    }

    /// Metadata for a container node.
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Json, "folder")
    }

    pub fn number(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Number, role)
    }

    pub fn text(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Text, role)
    }

    pub fn boolean(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Boolean, role)
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Kind and metadata of a stored node, as returned by [`ObjectStore::list_nodes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub meta: DisplayMetadata,
}

/// A node together with its current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    pub kind: NodeKind,
    pub meta: DisplayMetadata,
    #[serde(default)]
    pub value: Value,
}

/// Hierarchical object store.
///
/// Methods take `&self`; implementations synchronize internally so one store
/// can be shared between a scheduled and a manually triggered poll. Writes are
/// last-write-wins per id.
pub trait ObjectStore: Send + Sync {
    /// Create a node unless one already exists at `id`.
    ///
    /// Returns `true` when a node was created. An existing node is left
    /// untouched, including its value.
    fn create_node_if_absent(&self, id: &str, kind: NodeKind, meta: &DisplayMetadata)
    -> Result<bool>;

    /// Replace a node's display metadata.
    fn set_node_metadata(&self, id: &str, meta: &DisplayMetadata) -> Result<()>;

    /// Write a node's value.
    fn write_value(&self, id: &str, value: Value) -> Result<()>;

    /// Ensure a leaf exists, then write its value.
    ///
    /// Returns `true` when the leaf was created by this call.
    fn upsert(&self, id: &str, meta: &DisplayMetadata, value: Value) -> Result<bool> {
        let created = self.create_node_if_absent(id, NodeKind::Leaf, meta)?;
        self.write_value(id, value)?;
        Ok(created)
    }

    /// Delete `id` and everything below it. Returns the number of nodes removed.
    fn delete_subtree(&self, id: &str) -> Result<usize>;

    /// Every node in the store, keyed by id.
    fn list_nodes(&self) -> Result<BTreeMap<String, NodeInfo>>;

    /// Kind and metadata of one node, `None` if it does not exist.
    fn node_info(&self, id: &str) -> Result<Option<NodeInfo>> {
        Ok(self.list_nodes()?.remove(id))
    }

    /// Current value of a node, `None` if the node does not exist.
    fn read_value(&self, id: &str) -> Result<Option<Value>>;

    /// Persist buffered changes. In-memory stores have nothing to do.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// A mutation recorded by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Create(String),
    SetMetadata(String),
    Write(String),
    Delete(String),
}

#[derive(Debug, Default)]
struct MemoryInner {
    nodes: BTreeMap<String, StoredNode>,
    ops: Vec<StoreOp>,
    recording: bool,
    failing_creates: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
}

impl MemoryInner {
    fn record(&mut self, op: StoreOp) {
        if self.recording {
            self.ops.push(op);
        }
    }
}

/// In-memory object store.
///
/// Clones share the same underlying map. A store built with
/// [`MemoryStore::recording`] keeps a log of every mutation; any store can be
/// told to fail creations or deletions of specific ids.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that logs every mutation.
    pub fn recording() -> Self {
        let store = Self::new();
        store.lock().recording = true;
        store
    }

    /// Create a store pre-populated with nodes.
    pub fn from_nodes(nodes: BTreeMap<String, StoredNode>) -> Self {
        let store = Self::new();
        store.lock().nodes = nodes;
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every future `create_node_if_absent(id, ..)` fail.
    pub fn fail_creates_of(&self, id: impl Into<String>) {
        self.lock().failing_creates.insert(id.into());
    }

    /// Make every future `delete_subtree(id)` fail.
    pub fn fail_deletes_of(&self, id: impl Into<String>) {
        self.lock().failing_deletes.insert(id.into());
    }

    /// Stop injecting delete failures.
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.failing_creates.clear();
        inner.failing_deletes.clear();
    }

    /// Mutations recorded so far, oldest first. Always empty unless built
    /// with [`MemoryStore::recording`].
    pub fn operations(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().ops.clear();
    }

    /// A copy of the node at `id`.
    pub fn node(&self, id: &str) -> Option<StoredNode> {
        self.lock().nodes.get(id).cloned()
    }

    /// Current value at `id`, `None` if the node is missing.
    pub fn value(&self, id: &str) -> Option<Value> {
        self.lock().nodes.get(id).map(|n| n.value.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().nodes.contains_key(id)
    }

    /// All ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.lock().nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// A copy of every node.
    pub fn snapshot(&self) -> BTreeMap<String, StoredNode> {
        self.lock().nodes.clone()
    }
}

impl ObjectStore for MemoryStore {
    fn create_node_if_absent(
        &self,
        id: &str,
        kind: NodeKind,
        meta: &DisplayMetadata,
    ) -> Result<bool> {
        if !id::is_valid(id) {
            return Err(Error::InvalidId(id.to_string()));
        }
        let mut inner = self.lock();
        if inner.nodes.contains_key(id) {
            return Ok(false);
        }
        if inner.failing_creates.contains(id) {
            return Err(Error::store("create", id, "injected failure"));
        }
        inner.nodes.insert(
            id.to_string(),
            StoredNode {
                kind,
                meta: meta.clone(),
                value: Value::Null,
            },
        );
        inner.record(StoreOp::Create(id.to_string()));
        Ok(true)
    }

    fn set_node_metadata(&self, id: &str, meta: &DisplayMetadata) -> Result<()> {
        let mut inner = self.lock();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?;
        node.meta = meta.clone();
        inner.record(StoreOp::SetMetadata(id.to_string()));
        Ok(())
    }

    fn write_value(&self, id: &str, value: Value) -> Result<()> {
        let mut inner = self.lock();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?;
        node.value = value;
        inner.record(StoreOp::Write(id.to_string()));
        Ok(())
    }

    fn delete_subtree(&self, id: &str) -> Result<usize> {
        let mut inner = self.lock();
        if inner.failing_deletes.contains(id) {
            return Err(Error::store("delete", id, "injected failure"));
        }
        let doomed: Vec<String> = inner
            .nodes
            .keys()
            .filter(|key| id::is_within(key, id))
            .cloned()
            .collect();
        for key in &doomed {
            inner.nodes.remove(key);
        }
        inner.record(StoreOp::Delete(id.to_string()));
        Ok(doomed.len())
    }

    fn list_nodes(&self) -> Result<BTreeMap<String, NodeInfo>> {
        Ok(self
            .lock()
            .nodes
            .iter()
            .map(|(id, node)| {
                (
                    id.clone(),
                    NodeInfo {
                        kind: node.kind,
                        meta: node.meta.clone(),
                    },
                )
            })
            .collect())
    }

    fn node_info(&self, id: &str) -> Result<Option<NodeInfo>> {
        Ok(self.node(id).map(|node| NodeInfo {
            kind: node.kind,
            meta: node.meta,
        }))
    }

    fn read_value(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.value(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(name: &str) -> DisplayMetadata {
        DisplayMetadata::text(name, "text")
    }

    #[test]
    fn test_create_if_absent_does_not_clobber() {
        let store = MemoryStore::new();
        assert!(store.create_node_if_absent("info.time", NodeKind::Leaf, &leaf("Time")).unwrap());
        store.write_value("info.time", json!("now")).unwrap();

        assert!(!store.create_node_if_absent("info.time", NodeKind::Leaf, &leaf("Other")).unwrap());
        let node = store.node("info.time").unwrap();
        assert_eq!(node.value, json!("now"));
        assert_eq!(node.meta.name, "Time");
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let store = MemoryStore::recording();
        assert!(store.upsert("server.status", &leaf("Status"), json!("started")).unwrap());
        assert!(!store.upsert("server.status", &leaf("Status"), json!("stopped")).unwrap());
        assert_eq!(store.value("server.status"), Some(json!("stopped")));
        assert_eq!(
            store.operations(),
            vec![
                StoreOp::Create("server.status".into()),
                StoreOp::Write("server.status".into()),
                StoreOp::Write("server.status".into()),
            ]
        );
    }

    #[test]
    fn test_write_to_missing_node_fails() {
        let store = MemoryStore::new();
        let err = store.write_value("nope", json!(1)).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let store = MemoryStore::new();
        assert!(store.create_node_if_absent("a..b", NodeKind::Leaf, &leaf("x")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_subtree_is_segment_aware() {
        let store = MemoryStore::new();
        for id in ["array", "array.disks", "array.disks.0", "array.disks.0.name", "array.disksx"] {
            store.create_node_if_absent(id, NodeKind::Container, &leaf(id)).unwrap();
        }
        assert_eq!(store.delete_subtree("array.disks").unwrap(), 3);
        assert_eq!(store.ids(), vec!["array".to_string(), "array.disksx".to_string()]);
    }

    #[test]
    fn test_injected_delete_failure() {
        let store = MemoryStore::new();
        store.create_node_if_absent("vms", NodeKind::Container, &leaf("VMs")).unwrap();
        store.fail_deletes_of("vms");
        assert!(store.delete_subtree("vms").is_err());
        assert!(store.contains("vms"));

        store.clear_failures();
        assert_eq!(store.delete_subtree("vms").unwrap(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.upsert("info.time", &leaf("Time"), json!("t")).unwrap();
        assert_eq!(store.read_value("info.time").unwrap(), Some(json!("t")));
        assert_eq!(store.list_nodes().unwrap().len(), 1);
    }

    #[test]
    fn test_metadata_serializes_without_empty_unit() {
        let meta = DisplayMetadata::number("Temperature", "value.temperature");
        let text = serde_json::to_string(&meta).unwrap();
        assert!(!text.contains("unit"));
        let with_unit = meta.with_unit("°C");
        assert_eq!(with_unit.unit.as_deref(), Some("°C"));
    }

    #[test]
    fn test_node_info() {
        let store = MemoryStore::new();
        store
            .create_node_if_absent("docker", NodeKind::Container, &DisplayMetadata::container("Docker"))
            .unwrap();
        let info = store.node_info("docker").unwrap().unwrap();
        assert_eq!(info.kind, NodeKind::Container);
        assert_eq!(info.meta.name, "Docker");
        assert!(store.node_info("vms").unwrap().is_none());
    }

    #[test]
    fn test_plain_store_keeps_no_log() {
        let store = MemoryStore::new();
        for i in 0..100 {
            store.upsert("server.status", &leaf("Status"), json!(i)).unwrap();
        }
        store.delete_subtree("server").unwrap();
        assert!(store.operations().is_empty());
    }
}
