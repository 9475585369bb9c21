//! CPU core family

use reconcile::coerce;
use reconcile::{LeafSpec, ResourceFamily, ValueKind};
use serde_json::Value;

/// Per-core load under `metrics.cpu.cores.<n>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuCores;

const SCHEMA: &[LeafSpec] = &[
    LeafSpec::new("percentTotal", "Load", ValueKind::Number, "value.load", |m| {
        coerce::percent(&m["percentTotal"])
    })
    .unit("%"),
    LeafSpec::new("percentUser", "User", ValueKind::Number, "value.load", |m| {
        coerce::percent(&m["percentUser"])
    })
    .unit("%"),
    LeafSpec::new("percentSystem", "System", ValueKind::Number, "value.load", |m| {
        coerce::percent(&m["percentSystem"])
    })
    .unit("%"),
    LeafSpec::new("percentIdle", "Idle", ValueKind::Number, "value.load", |m| {
        coerce::percent(&m["percentIdle"])
    })
    .unit("%"),
];

impl ResourceFamily for CpuCores {
    fn name(&self) -> &'static str {
        "core"
    }

    fn category(&self) -> &'static str {
        "metrics.cpu"
    }

    fn base_id(&self) -> &'static str {
        "metrics.cpu.cores"
    }

    fn member_path(&self) -> &'static [&'static str] {
        &["metrics", "cpu", "cpus"]
    }

    fn identity(&self, _member: &Value, position: usize) -> String {
        position.to_string()
    }

    fn member_label(&self, segment: &str, _member: Option<&Value>) -> Option<String> {
        Some(format!("Core {segment}"))
    }

    fn schema(&self) -> &'static [LeafSpec] {
        SCHEMA
    }
}
