//! Dynamic resource families
//!
//! A [`ResourceFamily`] describes a list in the response whose members each
//! get their own sub-tree (`array.disks.<idx>.*`, `docker.containers.<name>.*`).
//! The [`Reconciler`] keeps one membership snapshot per family and uses it to
//! decide when structure must be (re)created and when vanished members have
//! to be removed.

use crate::catalog::{Catalog, Selection};
use crate::error::Result;
use crate::id;
use crate::store::{DisplayMetadata, NodeKind, ObjectStore, ValueKind};
use crate::tree::ObjectTree;
use crate::writer::ensure_ancestors;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Segment of the per-family member count leaf.
pub const COUNT_SEGMENT: &str = "count";

/// One leaf every member of a family carries
#[derive(Debug, Clone, Copy)]
pub struct LeafSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub kind: ValueKind,
    pub role: &'static str,
    pub unit: Option<&'static str>,
    /// Reads the leaf's value from one member object
    pub extract: fn(&Value) -> Value,
}

impl LeafSpec {
    pub const fn new(
        key: &'static str,
        name: &'static str,
        kind: ValueKind,
        role: &'static str,
        extract: fn(&Value) -> Value,
    ) -> Self {
        Self {
            key,
            name,
            kind,
            role,
            unit: None,
            extract,
        }
    }

    #[must_use]
    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn metadata(&self) -> DisplayMetadata {
        let meta = DisplayMetadata::new(self.name, self.kind, self.role);
        match self.unit {
            Some(unit) => meta.with_unit(unit),
            None => meta,
        }
    }
}

/// A family of runtime-discovered resources.
pub trait ResourceFamily: Send + Sync + std::fmt::Debug {
    /// Short family name used in logs and bookkeeping (`disk`, `container`)
    fn name(&self) -> &'static str;

    /// Category that must be covered by the selection for this family to run
    fn category(&self) -> &'static str;

    /// Id under which member sub-trees are created
    fn base_id(&self) -> &'static str {
        self.category()
    }

    /// Path of the member list in the response payload
    fn member_path(&self) -> &'static [&'static str];

    /// Response root field the member list lives under
    fn root(&self) -> &'static str {
        self.member_path().first().copied().unwrap_or_default()
    }

    /// Raw identity of one member; sanitized before use as an id segment
    fn identity(&self, member: &Value, position: usize) -> String;

    /// Display label of a member container.
    ///
    /// `member` is `None` when only the stored segment is known (startup).
    fn member_label(&self, segment: &str, member: Option<&Value>) -> Option<String>;

    /// Whether a stored member container's `label` follows the naming rule.
    ///
    /// Checked at startup, where only the segment is known. Families whose
    /// labels are only derivable from a live member accept anything.
    fn label_fits(&self, segment: &str, label: &str) -> bool {
        self.member_label(segment, None).is_none_or(|expected| expected == label)
    }

    /// Leaves created under every member
    fn schema(&self) -> &'static [LeafSpec];

    /// Members in the payload.
    ///
    /// `None` when the response root is absent; a missing or non-list member
    /// path counts as zero members.
    fn members<'a>(&self, payload: &'a Value) -> Option<Vec<&'a Value>> {
        let mut current = payload.get(self.root()).filter(|v| !v.is_null())?;
        for step in self.member_path().iter().skip(1) {
            match current.get(*step) {
                Some(next) => current = next,
                None => return Some(Vec::new()),
            }
        }
        Some(current.as_array().map(|list| list.iter().collect()).unwrap_or_default())
    }

    /// Id of the member count leaf.
    fn count_id(&self) -> String {
        id::join(self.base_id(), COUNT_SEGMENT)
    }
}

/// Last seen member sets, one per family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshots {
    families: BTreeMap<String, BTreeSet<String>>,
}

impl MembershipSnapshots {
    pub fn get(&self, family: &str) -> Option<&BTreeSet<String>> {
        self.families.get(family)
    }

    pub fn replace(&mut self, family: &str, members: BTreeSet<String>) {
        self.families.insert(family.to_string(), members);
    }

    /// Drop a family's snapshot so the next run is structural.
    pub fn forget(&mut self, family: &str) {
        self.families.remove(family);
    }

    /// A change is structural when there is no snapshot yet or the member
    /// set differs. Order is irrelevant.
    pub fn is_structural_change(&self, family: &str, members: &BTreeSet<String>) -> bool {
        self.families.get(family) != Some(members)
    }
}

/// What happened to one family in one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: String,
    pub members: usize,
    pub structural: bool,
    /// Member sub-trees created this cycle
    pub created: Vec<String>,
    /// Member sub-trees removed this cycle
    pub removed: Vec<String>,
    /// Ids whose store operation failed
    pub failures: Vec<String>,
}

/// Applies family members to the store across cycles
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    snapshots: MembershipSnapshots,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &MembershipSnapshots {
        &self.snapshots
    }

    /// Forget every snapshot; the next cycle recreates all structure.
    pub fn reset(&mut self) {
        self.snapshots = MembershipSnapshots::default();
    }

    /// Reconcile every family against `payload`.
    ///
    /// Families whose category is not covered are skipped and their snapshot
    /// is dropped. Families whose response root is absent are skipped with
    /// their nodes left in place.
    pub fn reconcile(
        &mut self,
        payload: &Value,
        families: &[Box<dyn ResourceFamily>],
        selection: &Selection,
        catalog: &Catalog,
        store: &dyn ObjectStore,
        tree: &mut ObjectTree,
    ) -> Vec<FamilyReport> {
        let mut reports = Vec::new();
        for family in families {
            if !selection.covers(family.category()) {
                self.snapshots.forget(family.name());
                continue;
            }
            let Some(members) = family.members(payload) else {
                log::debug!("No '{}' in response, skipping {}", family.root(), family.name());
                continue;
            };
            reports.push(self.reconcile_family(family.as_ref(), &members, catalog, store, tree));
        }
        reports
    }

    fn reconcile_family(
        &mut self,
        family: &dyn ResourceFamily,
        members: &[&Value],
        catalog: &Catalog,
        store: &dyn ObjectStore,
        tree: &mut ObjectTree,
    ) -> FamilyReport {
        let name = family.name();
        let base = family.base_id();
        let mut report = FamilyReport {
            family: name.to_string(),
            members: members.len(),
            ..FamilyReport::default()
        };

        let keyed: Vec<(String, &Value)> = members
            .iter()
            .enumerate()
            .map(|(position, member)| {
                let segment = id::sanitize_resource_name(&family.identity(member, position));
                (segment, *member)
            })
            .collect();
        let current: BTreeSet<String> = keyed.iter().map(|(segment, _)| segment.clone()).collect();
        if current.len() < keyed.len() {
            log::warn!("{name}: duplicate member identities, later members overwrite earlier ones");
        }

        let count_id = family.count_id();
        // Members whose container could not be created this cycle
        let mut missing = BTreeSet::new();
        report.structural = self.snapshots.is_structural_change(name, &current);
        if report.structural {
            log::debug!("{name}: structure changed, {} members", current.len());
            if let Err(e) = ensure_ancestors(&count_id, catalog, store, tree) {
                log::warn!("{name}: cannot create {base}: {e}");
                report.failures.push(base.to_string());
            }
            for (segment, member) in &keyed {
                if !create_member(family, segment, member, store, &mut report) {
                    missing.insert(segment.clone());
                }
            }
            let count_meta = DisplayMetadata::number("Count", "value");
            match store.upsert(&count_id, &count_meta, Value::from(current.len())) {
                Ok(_) => tree.mark_seen(&count_id, NodeKind::Leaf, Some(name), None),
                Err(e) => {
                    log::warn!("{name}: failed to write {count_id}: {e}");
                    report.failures.push(count_id.clone());
                }
            }
        } else {
            tree.mark_seen(&count_id, NodeKind::Leaf, Some(name), None);
        }
        tree.mark_seen(base, NodeKind::Container, None, None);

        for (segment, member) in &keyed {
            if missing.contains(segment) {
                continue;
            }
            let member_id = id::join(base, segment);
            tree.mark_seen(&member_id, NodeKind::Container, Some(name), Some(segment));
            for spec in family.schema() {
                let leaf_id = id::join(&member_id, spec.key);
                let value = (spec.extract)(member);
                match store.upsert(&leaf_id, &spec.metadata(), value) {
                    Ok(_) => tree.mark_seen(&leaf_id, NodeKind::Leaf, Some(name), Some(segment)),
                    Err(e) => {
                        log::warn!("{name}: failed to write {leaf_id}: {e}");
                        report.failures.push(leaf_id);
                    }
                }
            }
        }

        if missing.is_empty() {
            self.snapshots.replace(name, current.clone());
        } else {
            // Retry creation on the next cycle
            self.snapshots.forget(name);
        }
        report.removed = tree.reconcile_family(name, &current, store).removed;
        report
    }
}

/// Create a member container and its leaves, leaving existing nodes alone
/// apart from a container label that no longer matches the live member.
///
/// Returns whether the member container exists afterwards.
fn create_member(
    family: &dyn ResourceFamily,
    segment: &str,
    member: &Value,
    store: &dyn ObjectStore,
    report: &mut FamilyReport,
) -> bool {
    let name = family.name();
    let member_id = id::join(family.base_id(), segment);
    let label = family.member_label(segment, Some(member));
    let meta = DisplayMetadata::container(label.clone().unwrap_or_else(|| segment.to_string()));

    match store.create_node_if_absent(&member_id, NodeKind::Container, &meta) {
        Ok(true) => report.created.push(member_id.clone()),
        Ok(false) => {
            if let Some(label) = label
                && let Err(e) = refresh_label(&member_id, &label, store)
            {
                log::warn!("{name}: failed to relabel {member_id}: {e}");
                report.failures.push(member_id.clone());
            }
        }
        Err(e) => {
            log::warn!("{name}: failed to create {member_id}: {e}");
            report.failures.push(member_id);
            return false;
        }
    }

    for spec in family.schema() {
        let leaf_id = id::join(&member_id, spec.key);
        if let Err(e) = store.create_node_if_absent(&leaf_id, NodeKind::Leaf, &spec.metadata()) {
            log::warn!("{name}: failed to create {leaf_id}: {e}");
            report.failures.push(leaf_id);
        }
    }
    true
}

/// Set an existing container's label to `label` if it differs.
fn refresh_label(node_id: &str, label: &str, store: &dyn ObjectStore) -> Result<()> {
    let Some(info) = store.node_info(node_id)? else {
        return Ok(());
    };
    if info.meta.name == label {
        return Ok(());
    }
    let mut meta = info.meta;
    meta.name = label.to_string();
    store.set_node_metadata(node_id, &meta)?;
    log::debug!("Relabeled {node_id} to '{label}'");
    Ok(())
}
