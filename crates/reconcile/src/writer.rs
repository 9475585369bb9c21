//! Static mapping writer
//!
//! Walks the selected domains' mappings over a response payload and writes
//! one coerced value per mapping, creating missing ancestor containers on
//! the way.

use crate::catalog::{Catalog, Domain};
use crate::id;
use crate::store::{DisplayMetadata, NodeKind, ObjectStore};
use crate::tree::ObjectTree;
use serde_json::Value;

/// Outcome of one [`apply_static_mappings`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticWriteReport {
    /// Leaves written
    pub written: usize,
    /// Domains skipped because their root was absent from the payload
    pub skipped_domains: Vec<String>,
    /// Ids whose write failed
    pub failures: Vec<String>,
}

/// Follow `path` through nested objects.
///
/// Any missing step, or a step into a non-object, yields `Null`.
pub fn resolve_path<'a>(payload: &'a Value, path: &[String]) -> &'a Value {
    let mut current = payload;
    for step in path {
        match current.get(step.as_str()) {
            Some(next) if current.is_object() => current = next,
            _ => return &Value::Null,
        }
    }
    current
}

/// Create every missing ancestor container of `node_id`.
///
/// Labels come from the catalog when it knows the id, otherwise the last
/// segment is used.
pub fn ensure_ancestors(
    node_id: &str,
    catalog: &Catalog,
    store: &dyn ObjectStore,
    tree: &mut ObjectTree,
) -> crate::Result<()> {
    for ancestor in id::ancestors(node_id) {
        if tree.contains(ancestor) {
            tree.mark_seen(ancestor, NodeKind::Container, None, None);
            continue;
        }
        let label = catalog
            .label_for(ancestor)
            .unwrap_or_else(|| id::last_segment(ancestor));
        store.create_node_if_absent(
            ancestor,
            NodeKind::Container,
            &DisplayMetadata::container(label),
        )?;
        tree.mark_seen(ancestor, NodeKind::Container, None, None);
    }
    Ok(())
}

/// Write every static mapping of `domains` from `payload`.
///
/// A domain whose root field is absent from the payload is skipped entirely;
/// its nodes keep their previous values. A present root with missing inner
/// fields writes `null`-derived values through the mapping's coercion.
/// Store failures are logged per node and never abort the pass.
pub fn apply_static_mappings(
    payload: &Value,
    domains: &[&Domain],
    catalog: &Catalog,
    store: &dyn ObjectStore,
    tree: &mut ObjectTree,
) -> StaticWriteReport {
    let mut report = StaticWriteReport::default();

    for domain in domains {
        let Some(root) = domain.root() else {
            continue;
        };
        if payload.get(root).is_none_or(Value::is_null) {
            log::debug!(
                "No '{root}' in response, keeping previous values for {}",
                domain.category_id
            );
            report.skipped_domains.push(domain.category_id.clone());
            continue;
        }

        for mapping in &domain.mappings {
            let raw = resolve_path(payload, &mapping.remote_path);
            let value = (mapping.coerce)(raw);

            let written = ensure_ancestors(&mapping.local_id, catalog, store, tree)
                .and_then(|()| store.upsert(&mapping.local_id, &mapping.meta, value));
            match written {
                Ok(_) => {
                    tree.mark_seen(&mapping.local_id, NodeKind::Leaf, None, None);
                    report.written += 1;
                }
                Err(e) => {
                    log::warn!("Failed to write {}: {e}", mapping.local_id);
                    report.failures.push(mapping.local_id.clone());
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, StaticMapping};
    use crate::coerce;
    use crate::query::{SelectionFragment, field, fields};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Category::new("info", "Info"),
                Category::new("server", "Server"),
            ],
            vec![
                Domain::new(
                    "info",
                    SelectionFragment::new("info", vec![fields("os", &["platform", "uptime"])]),
                )
                .with_mappings(vec![
                    StaticMapping::new(
                        "info.os.platform",
                        &["info", "os", "platform"],
                        DisplayMetadata::text("Platform", "text"),
                    )
                    .coerce(coerce::text),
                    StaticMapping::new(
                        "info.os.uptime",
                        &["info", "os", "uptime"],
                        DisplayMetadata::text("Uptime", "date"),
                    ),
                ]),
                Domain::new("server", SelectionFragment::new("server", vec![field("status")]))
                    .with_mappings(vec![StaticMapping::new(
                        "server.status",
                        &["server", "status"],
                        DisplayMetadata::text("Status", "text"),
                    )]),
            ],
        )
        .unwrap()
    }

    fn all_domains(catalog: &Catalog) -> Vec<&Domain> {
        catalog.domains().iter().collect()
    }

    #[test]
    fn test_resolve_path() {
        let payload = json!({"info": {"os": {"platform": "linux"}, "flat": 3}});
        let path = |p: &[&str]| p.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();

        assert_eq!(resolve_path(&payload, &path(&["info", "os", "platform"])), &json!("linux"));
        assert_eq!(resolve_path(&payload, &path(&["info", "missing"])), &Value::Null);
        assert_eq!(resolve_path(&payload, &path(&["info", "flat", "deeper"])), &Value::Null);
        assert_eq!(resolve_path(&json!([1, 2]), &path(&["0"])), &Value::Null);
    }

    #[test]
    fn test_writes_values_and_creates_ancestors() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut tree = ObjectTree::new();
        let payload = json!({"info": {"os": {"platform": "linux", "uptime": "2024-01-01"}}});

        let report =
            apply_static_mappings(&payload, &all_domains(&catalog), &catalog, &store, &mut tree);

        assert_eq!(report.written, 2);
        assert_eq!(report.skipped_domains, vec!["server".to_string()]);
        assert_eq!(store.value("info.os.platform"), Some(json!("linux")));

        let info = store.node("info").unwrap();
        assert_eq!(info.kind, NodeKind::Container);
        assert_eq!(info.meta.name, "Info");
        assert_eq!(store.node("info.os").unwrap().meta.name, "os");
        assert!(tree.contains("info.os.uptime"));
        assert!(!store.contains("server.status"));
    }

    #[test]
    fn test_missing_inner_field_writes_coerced_null() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut tree = ObjectTree::new();
        let payload = json!({"info": {"os": {}}});

        apply_static_mappings(&payload, &all_domains(&catalog), &catalog, &store, &mut tree);
        assert_eq!(store.value("info.os.platform"), Some(Value::Null));
    }

    #[test]
    fn test_absent_root_keeps_previous_values() {
        let catalog = catalog();
        let store = MemoryStore::recording();
        let mut tree = ObjectTree::new();
        let domains = all_domains(&catalog);

        apply_static_mappings(&json!({"server": {"status": "started"}}), &domains, &catalog, &store, &mut tree);
        store.clear_operations();

        let report = apply_static_mappings(&json!({"info": null}), &domains, &catalog, &store, &mut tree);
        assert_eq!(report.written, 0);
        assert_eq!(store.value("server.status"), Some(json!("started")));
        assert!(store.operations().is_empty());
    }

    #[test]
    fn test_known_ancestors_are_not_recreated() {
        let catalog = catalog();
        let store = MemoryStore::recording();
        let mut tree = ObjectTree::new();
        let payload = json!({"server": {"status": "started"}});
        let domains = all_domains(&catalog);

        apply_static_mappings(&payload, &domains, &catalog, &store, &mut tree);
        store.clear_operations();
        apply_static_mappings(&payload, &domains, &catalog, &store, &mut tree);

        assert_eq!(
            store.operations(),
            vec![crate::store::StoreOp::Write("server.status".into())]
        );
    }
}
