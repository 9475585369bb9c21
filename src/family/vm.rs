//! Virtual machine family

use reconcile::coerce;
use reconcile::{LeafSpec, ResourceFamily, ValueKind};
use serde_json::Value;

/// Virtual machines under `vms.list.<uuid>`.
///
/// Keyed by UUID; names are not stable across re-creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualMachines;

const SCHEMA: &[LeafSpec] = &[
    LeafSpec::new("name", "Name", ValueKind::Text, "text", |m| coerce::text(&m["name"])),
    LeafSpec::new("state", "State", ValueKind::Text, "indicator.status", |m| {
        coerce::text(&m["state"])
    }),
    LeafSpec::new("running", "Running", ValueKind::Boolean, "indicator.running", |m| {
        m["state"]
            .as_str()
            .map_or(Value::Null, |state| Value::Bool(state.eq_ignore_ascii_case("running")))
    }),
    LeafSpec::new("id", "Control id", ValueKind::Text, "text", |m| coerce::text(&m["id"])),
];

impl ResourceFamily for VirtualMachines {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn category(&self) -> &'static str {
        "vms.list"
    }

    fn member_path(&self) -> &'static [&'static str] {
        &["vms", "domains"]
    }

    fn identity(&self, member: &Value, _position: usize) -> String {
        ["uuid", "id"]
            .iter()
            .find_map(|key| member[*key].as_str().filter(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string()
    }

    fn member_label(&self, _segment: &str, member: Option<&Value>) -> Option<String> {
        // The stored segment is a UUID; only a live member knows its name
        member.and_then(|m| m["name"].as_str()).map(str::to_string)
    }

    fn schema(&self) -> &'static [LeafSpec] {
        SCHEMA
    }
}
