use anyhow::Result;
use colored::Colorize;
use reconcile::{NodeKind, StoredNode, id};
use std::collections::BTreeMap;

use crate::Context;
use crate::config;
use crate::store::JsonFileStore;
use crate::ui;

pub fn run(ctx: &Context, prefix: Option<&str>) -> Result<()> {
    let settings = super::try_load_settings(ctx)?;
    let path = settings
        .as_ref()
        .map_or_else(config::default_state_path, |s| s.state_path());

    ui::header("Mirrored Objects");
    ui::kv("State file", &path.display().to_string());

    if !path.exists() {
        ui::warn("No state yet. Run: unraid-mirror once");
        return Ok(());
    }

    let store = JsonFileStore::open(&path)?;
    let nodes = store.snapshot();
    let shown = filter(&nodes, prefix);
    ui::kv(
        "Nodes",
        &format!("{} shown, {} total", shown.len(), nodes.len()),
    );
    println!();

    if shown.is_empty() {
        if let Some(prefix) = prefix {
            ui::warn(&format!("Nothing within '{prefix}'"));
        }
        return Ok(());
    }

    for (node_id, node) in shown {
        println!("{}", render(node_id, node));
    }
    Ok(())
}

fn filter<'a>(
    nodes: &'a BTreeMap<String, StoredNode>,
    prefix: Option<&str>,
) -> Vec<(&'a str, &'a StoredNode)> {
    nodes
        .iter()
        .filter(|(node_id, _)| prefix.is_none_or(|p| id::is_within(node_id, p)))
        .map(|(node_id, node)| (node_id.as_str(), node))
        .collect()
}

fn render(node_id: &str, node: &StoredNode) -> String {
    let indent = ui::indent(id::depth(node_id));
    let segment = id::last_segment(node_id);
    match node.kind {
        NodeKind::Container => {
            if node.meta.name == segment {
                format!("{indent}{}", segment.bold())
            } else {
                format!("{indent}{} {}", segment.bold(), node.meta.name.dimmed())
            }
        }
        NodeKind::Leaf => format!(
            "{indent}{}: {}",
            segment.dimmed(),
            ui::format_value(&node.value, node.meta.unit.as_deref())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::DisplayMetadata;
    use serde_json::json;

    fn nodes() -> BTreeMap<String, StoredNode> {
        let container = |name: &str| StoredNode {
            kind: NodeKind::Container,
            meta: DisplayMetadata::container(name),
            value: serde_json::Value::Null,
        };
        let mut nodes = BTreeMap::new();
        nodes.insert("docker".to_string(), container("Docker"));
        nodes.insert("docker.containers".to_string(), container("Containers"));
        nodes.insert("docker.containers.plex".to_string(), container("plex"));
        nodes.insert(
            "docker.containers.plex.state".to_string(),
            StoredNode {
                kind: NodeKind::Leaf,
                meta: DisplayMetadata::text("State", "indicator.status"),
                value: json!("RUNNING"),
            },
        );
        nodes.insert("dockerd".to_string(), container("Lookalike"));
        nodes
    }

    #[test]
    fn test_filter_by_prefix() {
        let nodes = nodes();
        assert_eq!(filter(&nodes, None).len(), 5);

        let ids: Vec<&str> = filter(&nodes, Some("docker.containers"))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(
            ids,
            vec!["docker.containers", "docker.containers.plex", "docker.containers.plex.state"]
        );
        assert_eq!(filter(&nodes, Some("docker")).len(), 4);
    }

    #[test]
    fn test_render_leaf_value() {
        colored::control::set_override(false);
        let nodes = nodes();
        let leaf = &nodes["docker.containers.plex.state"];
        assert_eq!(render("docker.containers.plex.state", leaf), "      state: RUNNING");
        assert_eq!(render("docker", &nodes["docker"]), "docker Docker");
        assert_eq!(render("docker.containers.plex", &nodes["docker.containers.plex"]), "    plex");
    }
}
