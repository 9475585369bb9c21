//! Docker container family

use reconcile::coerce;
use reconcile::{LeafSpec, ResourceFamily, ValueKind, id};
use serde_json::Value;

/// Docker containers under `docker.containers.<name>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Containers;

const SCHEMA: &[LeafSpec] = &[
    LeafSpec::new("name", "Name", ValueKind::Text, "text", |m| {
        first_name(m).map_or(Value::Null, Value::String)
    }),
    LeafSpec::new("image", "Image", ValueKind::Text, "text", |m| coerce::text(&m["image"])),
    LeafSpec::new("state", "State", ValueKind::Text, "indicator.status", |m| {
        coerce::text(&m["state"])
    }),
    LeafSpec::new("status", "Status", ValueKind::Text, "text", |m| coerce::text(&m["status"])),
    LeafSpec::new("autoStart", "Autostart", ValueKind::Boolean, "indicator", |m| {
        coerce::boolean(&m["autoStart"])
    }),
    LeafSpec::new("sizeRootFs", "Size", ValueKind::Number, "value", |m| {
        coerce::bytes_to_gb(&m["sizeRootFs"])
    })
    .unit("GB"),
];

/// First declared name without its leading `/`.
fn first_name(member: &Value) -> Option<String> {
    let raw = member["names"][0].as_str()?;
    Some(raw.strip_prefix('/').unwrap_or(raw).to_string())
}

impl ResourceFamily for Containers {
    fn name(&self) -> &'static str {
        "container"
    }

    fn category(&self) -> &'static str {
        "docker.containers"
    }

    fn member_path(&self) -> &'static [&'static str] {
        &["docker", "containers"]
    }

    fn identity(&self, member: &Value, _position: usize) -> String {
        member["names"][0].as_str().unwrap_or_default().to_string()
    }

    fn member_label(&self, segment: &str, member: Option<&Value>) -> Option<String> {
        match member {
            Some(member) => first_name(member),
            None => Some(segment.to_string()),
        }
    }

    fn label_fits(&self, segment: &str, label: &str) -> bool {
        // The segment is sanitized; a live name that sanitizes to it is fine
        id::sanitize_resource_name(label) == segment
    }

    fn schema(&self) -> &'static [LeafSpec] {
        SCHEMA
    }
}
