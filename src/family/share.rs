//! User share family

use reconcile::coerce::{self, usage_percent_from_free};
use reconcile::{LeafSpec, ResourceFamily, ValueKind, id};
use serde_json::Value;

/// User shares under `shares.<name>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shares;

const SCHEMA: &[LeafSpec] = &[
    LeafSpec::new("name", "Name", ValueKind::Text, "text", |m| coerce::text(&m["name"])),
    LeafSpec::new("comment", "Comment", ValueKind::Text, "text", |m| coerce::text(&m["comment"])),
    LeafSpec::new("free", "Free", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["free"])
    })
    .unit("GB"),
    LeafSpec::new("used", "Used", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["used"])
    })
    .unit("GB"),
    LeafSpec::new("size", "Size", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["size"])
    })
    .unit("GB"),
    LeafSpec::new("usagePercent", "Usage", ValueKind::Number, "value.fill", |m| {
        usage_percent_from_free(&m["used"], &m["free"]).map_or(Value::Null, Value::from)
    })
    .unit("%"),
    LeafSpec::new("cache", "Cache", ValueKind::Text, "text", |m| coerce::text(&m["cache"])),
];

impl ResourceFamily for Shares {
    fn name(&self) -> &'static str {
        "share"
    }

    fn category(&self) -> &'static str {
        "shares"
    }

    fn member_path(&self) -> &'static [&'static str] {
        &["shares"]
    }

    fn identity(&self, member: &Value, _position: usize) -> String {
        member["name"].as_str().unwrap_or_default().to_string()
    }

    fn member_label(&self, segment: &str, member: Option<&Value>) -> Option<String> {
        match member {
            Some(member) => member["name"].as_str().map(str::to_string),
            None => Some(segment.to_string()),
        }
    }

    fn label_fits(&self, segment: &str, label: &str) -> bool {
        id::sanitize_resource_name(label) == segment
    }

    fn schema(&self) -> &'static [LeafSpec] {
        SCHEMA
    }
}
