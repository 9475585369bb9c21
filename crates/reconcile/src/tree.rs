//! Object tree bookkeeping
//!
//! [`ObjectTree`] keeps one [`TrackedObject`] per node the mirror knows
//! about, independent of the node's value. It is reconciled against the real
//! store once at startup and afterwards decides which nodes go away when a
//! category is deselected or a dynamic resource disappears.

use crate::catalog::{Catalog, Selection};
use crate::error::Result;
use crate::family::{COUNT_SEGMENT, ResourceFamily};
use crate::id;
use crate::store::{NodeKind, ObjectStore};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Bookkeeping record for one addressable node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedObject {
    pub id: String,
    pub kind: NodeKind,
    pub last_seen: DateTime<Utc>,
    /// Implied by the catalog rather than discovered at runtime
    pub is_static: bool,
    /// Resource family (e.g. `container`) for dynamically created nodes
    pub family: Option<String>,
    /// Sanitized identity of the resource within its family
    pub resource_id: Option<String>,
}

/// Outcome of [`ObjectTree::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub imported: usize,
    pub dynamic: usize,
    pub relabeled: Vec<String>,
}

/// Outcome of a removal pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Sub-tree roots that were deleted
    pub removed: Vec<String>,
    /// Sub-tree roots whose deletion failed (still tracked)
    pub failed: Vec<String>,
}

impl RemovalReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.failed.is_empty()
    }
}

/// The set of tracked objects
#[derive(Debug, Clone)]
pub struct ObjectTree {
    objects: BTreeMap<String, TrackedObject>,
    static_ids: BTreeSet<String>,
    cycle: DateTime<Utc>,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTree {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            static_ids: BTreeSet::new(),
            cycle: Utc::now(),
        }
    }

    /// Import the store's existing nodes.
    ///
    /// Every node becomes a tracked object: static when the catalog implies
    /// its id, dynamic otherwise. Dynamic nodes below a family's base id are
    /// tagged with that family and resource, and member containers whose
    /// label no longer matches the family's naming rule are relabeled.
    pub fn initialize(
        &mut self,
        catalog: &Catalog,
        families: &[Box<dyn ResourceFamily>],
        store: &dyn ObjectStore,
    ) -> Result<InitReport> {
        self.static_ids = catalog.static_ids();
        self.objects.clear();
        self.cycle = Utc::now();

        let mut report = InitReport::default();
        for (node_id, info) in store.list_nodes()? {
            let is_static = self.static_ids.contains(&node_id);
            let mut family_tag = None;
            let mut resource_id = None;

            if !is_static && let Some(family) = owning_family(families, &node_id) {
                family_tag = Some(family.name().to_string());
                let rest = &node_id[family.base_id().len() + 1..];
                let segment = rest.split(id::SEPARATOR).next().unwrap_or(rest);
                let is_member_root = segment == rest;

                if !(is_member_root && segment == COUNT_SEGMENT) {
                    resource_id = Some(segment.to_string());
                }

                if is_member_root
                    && info.kind == NodeKind::Container
                    && !family.label_fits(segment, &info.meta.name)
                    && let Some(expected) = family.member_label(segment, None)
                {
                    let mut meta = info.meta.clone();
                    meta.name = expected;
                    match store.set_node_metadata(&node_id, &meta) {
                        Ok(()) => report.relabeled.push(node_id.clone()),
                        Err(e) => log::warn!("Failed to relabel {node_id}: {e}"),
                    }
                }
            }

            if !is_static {
                report.dynamic += 1;
            }
            report.imported += 1;
            self.objects.insert(
                node_id.clone(),
                TrackedObject {
                    id: node_id,
                    kind: info.kind,
                    last_seen: self.cycle,
                    is_static,
                    family: family_tag,
                    resource_id,
                },
            );
        }

        log::info!(
            "Imported {} existing nodes ({} dynamic, {} relabeled)",
            report.imported,
            report.dynamic,
            report.relabeled.len()
        );
        Ok(report)
    }

    /// Start a new cycle; nodes seen from now on get this timestamp.
    pub fn begin_cycle(&mut self) -> DateTime<Utc> {
        self.cycle = Utc::now();
        self.cycle
    }

    /// Timestamp of the current cycle.
    pub fn cycle(&self) -> DateTime<Utc> {
        self.cycle
    }

    /// Record that `id` was observed in the current cycle.
    pub fn mark_seen(
        &mut self,
        node_id: &str,
        kind: NodeKind,
        family: Option<&str>,
        resource_id: Option<&str>,
    ) {
        let cycle = self.cycle;
        let is_static = self.static_ids.contains(node_id);
        let object = self
            .objects
            .entry(node_id.to_string())
            .or_insert_with(|| TrackedObject {
                id: node_id.to_string(),
                kind,
                last_seen: cycle,
                is_static,
                family: None,
                resource_id: None,
            });
        object.last_seen = cycle;
        object.kind = kind;
        if let Some(family) = family {
            object.family = Some(family.to_string());
        }
        if let Some(resource_id) = resource_id {
            object.resource_id = Some(resource_id.to_string());
        }
    }

    /// Delete every tracked resource of `family` that is not in `current`.
    ///
    /// The resource's whole sub-tree is removed from the store and from the
    /// bookkeeping. A failed deletion is logged and left tracked, so the next
    /// reconciliation of the family tries again.
    pub fn reconcile_family(
        &mut self,
        family: &str,
        current: &BTreeSet<String>,
        store: &dyn ObjectStore,
    ) -> RemovalReport {
        // resource id -> shallowest tracked node of that resource
        let mut vanished: BTreeMap<&str, &str> = BTreeMap::new();
        for object in self.objects.values() {
            if object.family.as_deref() != Some(family) {
                continue;
            }
            let Some(resource_id) = object.resource_id.as_deref() else {
                continue;
            };
            if current.contains(resource_id) {
                continue;
            }
            vanished
                .entry(resource_id)
                .and_modify(|root| {
                    if id::depth(&object.id) < id::depth(root) {
                        *root = object.id.as_str();
                    }
                })
                .or_insert(object.id.as_str());
        }
        let roots: Vec<String> = vanished.into_values().map(str::to_string).collect();

        let mut report = RemovalReport::default();
        for root in roots {
            match store.delete_subtree(&root) {
                Ok(count) => {
                    log::info!("Removed {family} {root} ({count} nodes)");
                    self.forget_within(&root);
                    report.removed.push(root);
                }
                Err(e) => {
                    log::warn!("Failed to remove {family} {root}: {e}");
                    report.failed.push(root);
                }
            }
        }
        report
    }

    /// Delete every node the selection no longer allows.
    ///
    /// Allowed are the selected categories with everything below them, and
    /// the ancestors of selected categories (the ancestor node itself only).
    pub fn prune_deselected(
        &mut self,
        selection: &Selection,
        store: &dyn ObjectStore,
    ) -> RemovalReport {
        let mut report = RemovalReport::default();
        let nodes = match store.list_nodes() {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("Cannot list nodes for pruning: {e}");
                return report;
            }
        };

        let mut failed_roots: Vec<String> = Vec::new();
        for node_id in nodes.keys() {
            if selection.allows(node_id) {
                continue;
            }
            let handled = report
                .removed
                .iter()
                .chain(failed_roots.iter())
                .any(|root| id::is_within(node_id, root));
            if handled {
                continue;
            }
            match store.delete_subtree(node_id) {
                Ok(count) => {
                    log::info!("Pruned deselected {node_id} ({count} nodes)");
                    self.forget_within(node_id);
                    report.removed.push(node_id.clone());
                }
                Err(e) => {
                    log::warn!("Failed to prune {node_id}: {e}");
                    failed_roots.push(node_id.clone());
                }
            }
        }
        report.failed = failed_roots;

        // Bookkeeping without a backing node
        let failed = &report.failed;
        self.objects.retain(|object_id, _| {
            let kept = selection.allows(object_id)
                || failed.iter().any(|root| id::is_within(object_id, root));
            kept && nodes.contains_key(object_id)
        });
        report
    }

    fn forget_within(&mut self, root: &str) {
        self.objects.retain(|object_id, _| !id::is_within(object_id, root));
    }

    pub fn get(&self, node_id: &str) -> Option<&TrackedObject> {
        self.objects.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.objects.contains_key(node_id)
    }

    pub fn is_static(&self, node_id: &str) -> bool {
        self.static_ids.contains(node_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    /// Tracked ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    /// Resource ids currently tracked for a family.
    pub fn family_members(&self, family: &str) -> BTreeSet<String> {
        self.objects
            .values()
            .filter(|o| o.family.as_deref() == Some(family))
            .filter_map(|o| o.resource_id.clone())
            .collect()
    }
}

/// The family whose base id is the longest strict prefix of `node_id`.
fn owning_family<'a>(
    families: &'a [Box<dyn ResourceFamily>],
    node_id: &str,
) -> Option<&'a dyn ResourceFamily> {
    families
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| id::is_strictly_within(node_id, f.base_id()))
        .max_by_key(|f| f.base_id().len())
}
