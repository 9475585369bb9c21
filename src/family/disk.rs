//! Array device families (data, parity, cache)

use super::index_or_position;
use reconcile::coerce::{self, usage_percent};
use reconcile::{LeafSpec, ResourceFamily, ValueKind};
use serde_json::Value;

/// Which array device list a [`DeviceList`] mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Data,
    Parity,
    Cache,
}

impl DeviceRole {
    fn label(self) -> &'static str {
        match self {
            Self::Data => "Disk",
            Self::Parity => "Parity",
            Self::Cache => "Cache",
        }
    }
}

/// Array devices under `array.<list>.<idx>`.
#[derive(Debug, Clone, Copy)]
pub struct DeviceList {
    role: DeviceRole,
}

impl DeviceList {
    pub const fn new(role: DeviceRole) -> Self {
        Self { role }
    }
}

const SCHEMA: &[LeafSpec] = &[
    LeafSpec::new("name", "Name", ValueKind::Text, "text", |m| coerce::text(&m["name"])),
    LeafSpec::new("device", "Device", ValueKind::Text, "text", |m| coerce::text(&m["device"])),
    LeafSpec::new("status", "Status", ValueKind::Text, "indicator.status", |m| {
        coerce::text(&m["status"])
    }),
    LeafSpec::new("temp", "Temperature", ValueKind::Number, "value.temperature", |m| {
        coerce::number(&m["temp"])
    })
    .unit("°C"),
    LeafSpec::new("size", "Size", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["size"])
    })
    .unit("GB"),
    LeafSpec::new("fsSize", "Filesystem size", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["fsSize"])
    })
    .unit("GB"),
    LeafSpec::new("fsFree", "Filesystem free", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["fsFree"])
    })
    .unit("GB"),
    LeafSpec::new("fsUsed", "Filesystem used", ValueKind::Number, "value", |m| {
        coerce::kilobytes_to_gb(&m["fsUsed"])
    })
    .unit("GB"),
    LeafSpec::new("fsUsagePercent", "Filesystem usage", ValueKind::Number, "value.fill", |m| {
        usage_percent(&m["fsUsed"], &m["fsSize"]).map_or(Value::Null, Value::from)
    })
    .unit("%"),
    LeafSpec::new("fsType", "Filesystem", ValueKind::Text, "text", |m| coerce::text(&m["fsType"])),
    LeafSpec::new("numReads", "Reads", ValueKind::Number, "value", |m| coerce::big_int(&m["numReads"])),
    LeafSpec::new("numWrites", "Writes", ValueKind::Number, "value", |m| {
        coerce::big_int(&m["numWrites"])
    }),
    LeafSpec::new("numErrors", "Errors", ValueKind::Number, "value", |m| {
        coerce::big_int(&m["numErrors"])
    }),
    LeafSpec::new("type", "Type", ValueKind::Text, "text", |m| coerce::text(&m["type"])),
    LeafSpec::new("rotational", "Rotational", ValueKind::Boolean, "indicator", |m| {
        coerce::boolean(&m["rotational"])
    }),
];

impl ResourceFamily for DeviceList {
    fn name(&self) -> &'static str {
        match self.role {
            DeviceRole::Data => "disk",
            DeviceRole::Parity => "parity",
            DeviceRole::Cache => "cache",
        }
    }

    fn category(&self) -> &'static str {
        match self.role {
            DeviceRole::Data => "array.disks",
            DeviceRole::Parity => "array.parities",
            DeviceRole::Cache => "array.caches",
        }
    }

    fn member_path(&self) -> &'static [&'static str] {
        match self.role {
            DeviceRole::Data => &["array", "disks"],
            DeviceRole::Parity => &["array", "parities"],
            DeviceRole::Cache => &["array", "caches"],
        }
    }

    fn identity(&self, member: &Value, position: usize) -> String {
        index_or_position(member, "idx", position)
    }

    fn member_label(&self, segment: &str, _member: Option<&Value>) -> Option<String> {
        Some(format!("{} {segment}", self.role.label()))
    }

    fn schema(&self) -> &'static [LeafSpec] {
        SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(key: &str, member: &Value) -> Value {
        let spec = SCHEMA.iter().find(|s| s.key == key).unwrap();
        (spec.extract)(member)
    }

    #[test]
    fn test_roles() {
        let parities = DeviceList::new(DeviceRole::Parity);
        assert_eq!(parities.category(), "array.parities");
        assert_eq!(parities.member_path(), &["array", "parities"]);
        assert_eq!(parities.member_label("0", None).as_deref(), Some("Parity 0"));
        assert_eq!(
            DeviceList::new(DeviceRole::Cache).member_label("2", None).as_deref(),
            Some("Cache 2")
        );
    }

    #[test]
    fn test_identity_prefers_idx() {
        let disks = DeviceList::new(DeviceRole::Data);
        assert_eq!(disks.identity(&json!({"idx": 4, "name": "disk4"}), 0), "4");
        assert_eq!(disks.identity(&json!({"name": "disk1"}), 1), "1");
    }

    #[test]
    fn test_disk_values() {
        let disk = json!({
            "name": "disk1",
            "temp": 34,
            "size": 3_907_018_532_u64,
            "fsSize": "1048576",
            "fsUsed": "262144",
            "numErrors": "0",
            "numReads": "18446744073709551615",
            "rotational": true
        });
        assert_eq!(extract("name", &disk), json!("disk1"));
        assert_eq!(extract("temp", &disk), json!(34.0));
        assert_eq!(extract("size", &disk), json!(3726.02));
        assert_eq!(extract("fsSize", &disk), json!(1.0));
        assert_eq!(extract("fsUsagePercent", &disk), json!(25.0));
        assert_eq!(extract("numErrors", &disk), json!(0.0));
        assert_eq!(extract("numReads", &disk), Value::Null);
        assert_eq!(extract("rotational", &disk), json!(true));
        assert_eq!(extract("device", &disk), Value::Null);
    }

    #[test]
    fn test_usage_with_zero_size_is_null() {
        let disk = json!({"fsSize": 0, "fsUsed": 0});
        assert_eq!(extract("fsUsagePercent", &disk), Value::Null);
    }
}
