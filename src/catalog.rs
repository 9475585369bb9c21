//! The Unraid category catalog.
//!
//! Every category the mirror can track, the fields each one requests, and
//! the static values it maps. Resource lists (disks, containers, VMs, ...)
//! only declare their fragment here; their nodes come from [`crate::family`].

use anyhow::Result;
use reconcile::coerce::{self, usage_percent};
use reconcile::{
    Catalog, Category, DisplayMetadata, Domain, FieldSelection, SelectionFragment, StaticMapping,
    field, fields,
};
use serde_json::Value;

// Fields requested for every array device list
const DISK_FIELDS: &[&str] = &[
    "idx",
    "name",
    "device",
    "status",
    "temp",
    "size",
    "fsSize",
    "fsFree",
    "fsUsed",
    "fsType",
    "numReads",
    "numWrites",
    "numErrors",
    "type",
    "rotational",
];

/// Build the catalog.
pub fn unraid() -> Result<Catalog> {
    Ok(Catalog::new(categories(), domains())?)
}

fn categories() -> Vec<Category> {
    vec![
        Category::new("info", "System information").selected_by_default(),
        Category::new("server", "Server").selected_by_default(),
        Category::new("metrics", "Metrics")
            .selected_by_default()
            .with_children(vec![
                Category::new("metrics.cpu", "CPU").selected_by_default(),
                Category::new("metrics.memory", "Memory").selected_by_default(),
            ]),
        Category::new("array", "Array")
            .selected_by_default()
            .with_children(vec![
                Category::new("array.status", "Array status").selected_by_default(),
                Category::new("array.disks", "Data disks").selected_by_default(),
                Category::new("array.parities", "Parity disks").selected_by_default(),
                Category::new("array.caches", "Cache pools"),
            ]),
        Category::new("docker", "Docker")
            .with_children(vec![Category::new("docker.containers", "Containers")]),
        Category::new("vms", "Virtual machines")
            .with_children(vec![Category::new("vms.list", "VM list")]),
        Category::new("shares", "Shares"),
    ]
}

fn domains() -> Vec<Domain> {
    vec![
        info_domain(),
        server_domain(),
        Domain::new(
            "metrics.cpu",
            SelectionFragment::new(
                "metrics",
                vec![FieldSelection::nested(
                    "cpu",
                    vec![
                        field("percentTotal"),
                        fields(
                            "cpus",
                            &["percentTotal", "percentUser", "percentSystem", "percentIdle"],
                        ),
                    ],
                )],
            ),
        )
        .with_mappings(vec![
            StaticMapping::new(
                "metrics.cpu.percentTotal",
                &["metrics", "cpu", "percentTotal"],
                DisplayMetadata::number("CPU load", "value.load").with_unit("%"),
            )
            .coerce(coerce::number),
        ]),
        memory_domain(),
        Domain::new(
            "array.status",
            SelectionFragment::new(
                "array",
                vec![
                    field("state"),
                    FieldSelection::nested(
                        "capacity",
                        vec![fields("kilobytes", &["free", "used", "total"])],
                    ),
                ],
            ),
        )
        .with_mappings(vec![
            StaticMapping::new(
                "array.status.state",
                &["array", "state"],
                DisplayMetadata::text("Array state", "text"),
            )
            .coerce(coerce::text),
            capacity_mapping("capacityTotal", "Total capacity", "total"),
            capacity_mapping("capacityUsed", "Used capacity", "used"),
            capacity_mapping("capacityFree", "Free capacity", "free"),
            StaticMapping::new(
                "array.status.usedPercent",
                &["array", "capacity", "kilobytes"],
                DisplayMetadata::number("Used", "value.fill").with_unit("%"),
            )
            .coerce(capacity_used_percent),
        ]),
        device_list_domain("array.disks", "disks"),
        device_list_domain("array.parities", "parities"),
        device_list_domain("array.caches", "caches"),
        Domain::new(
            "docker.containers",
            SelectionFragment::new(
                "docker",
                vec![fields(
                    "containers",
                    &["id", "names", "image", "state", "status", "autoStart", "sizeRootFs"],
                )],
            ),
        ),
        Domain::new(
            "vms.list",
            SelectionFragment::new("vms", vec![fields("domains", &["id", "uuid", "name", "state"])]),
        ),
        Domain::new(
            "shares",
            SelectionFragment::new(
                "shares",
                ["name", "comment", "free", "used", "size", "cache"]
                    .into_iter()
                    .map(field)
                    .collect(),
            ),
        ),
    ]
}

fn info_domain() -> Domain {
    let text = |id: &str, path: &[&str], name: &str| {
        StaticMapping::new(id, path, DisplayMetadata::text(name, "text")).coerce(coerce::text)
    };
    let count = |id: &str, path: &[&str], name: &str| {
        StaticMapping::new(id, path, DisplayMetadata::number(name, "value")).coerce(coerce::number)
    };

    Domain::new(
        "info",
        SelectionFragment::new(
            "info",
            vec![
                field("time"),
                fields(
                    "os",
                    &["platform", "distro", "release", "uptime", "hostname", "kernel"],
                ),
                fields("cpu", &["manufacturer", "brand", "cores", "threads"]),
                fields("versions", &["unraid"]),
            ],
        ),
    )
    .with_mappings(vec![
        StaticMapping::new(
            "info.time",
            &["info", "time"],
            DisplayMetadata::text("Server time", "date"),
        ),
        text("info.os.platform", &["info", "os", "platform"], "Platform"),
        text("info.os.distro", &["info", "os", "distro"], "Distribution"),
        text("info.os.release", &["info", "os", "release"], "Release"),
        StaticMapping::new(
            "info.os.uptime",
            &["info", "os", "uptime"],
            DisplayMetadata::text("Booted at", "date"),
        ),
        text("info.os.hostname", &["info", "os", "hostname"], "Hostname"),
        text("info.os.kernel", &["info", "os", "kernel"], "Kernel"),
        text("info.cpu.manufacturer", &["info", "cpu", "manufacturer"], "Manufacturer"),
        text("info.cpu.brand", &["info", "cpu", "brand"], "Model"),
        count("info.cpu.cores", &["info", "cpu", "cores"], "Cores"),
        count("info.cpu.threads", &["info", "cpu", "threads"], "Threads"),
        text("info.versions.unraid", &["info", "versions", "unraid"], "Unraid version"),
    ])
}

fn server_domain() -> Domain {
    Domain::new(
        "server",
        SelectionFragment::new(
            "server",
            ["status", "name", "lanip", "localurl"].into_iter().map(field).collect(),
        ),
    )
    .with_mappings(vec![
        StaticMapping::new(
            "server.status",
            &["server", "status"],
            DisplayMetadata::text("Status", "indicator.status"),
        )
        .coerce(coerce::text),
        StaticMapping::new("server.name", &["server", "name"], DisplayMetadata::text("Name", "text"))
            .coerce(coerce::text),
        StaticMapping::new(
            "server.lanip",
            &["server", "lanip"],
            DisplayMetadata::text("LAN IP", "info.ip"),
        )
        .coerce(coerce::text),
        StaticMapping::new(
            "server.localurl",
            &["server", "localurl"],
            DisplayMetadata::text("Local URL", "url"),
        )
        .coerce(coerce::text),
    ])
}

fn memory_domain() -> Domain {
    let bytes = |key: &str, name: &str| {
        StaticMapping::new(
            format!("metrics.memory.{key}"),
            &["metrics", "memory", key],
            DisplayMetadata::number(name, "value").with_unit("GB"),
        )
        .coerce(coerce::bytes_to_gb)
    };
    let percent = |key: &str, name: &str| {
        StaticMapping::new(
            format!("metrics.memory.{key}"),
            &["metrics", "memory", key],
            DisplayMetadata::number(name, "value.fill").with_unit("%"),
        )
        .coerce(coerce::percent)
    };

    Domain::new(
        "metrics.memory",
        SelectionFragment::new(
            "metrics",
            vec![fields(
                "memory",
                &[
                    "total",
                    "used",
                    "free",
                    "available",
                    "active",
                    "percentTotal",
                    "swapTotal",
                    "swapUsed",
                    "swapFree",
                    "percentSwapTotal",
                ],
            )],
        ),
    )
    .with_mappings(vec![
        bytes("total", "Total memory"),
        bytes("used", "Used memory"),
        bytes("free", "Free memory"),
        bytes("available", "Available memory"),
        bytes("active", "Active memory"),
        percent("percentTotal", "Memory usage"),
        bytes("swapTotal", "Total swap"),
        bytes("swapUsed", "Used swap"),
        bytes("swapFree", "Free swap"),
        percent("percentSwapTotal", "Swap usage"),
    ])
}

fn device_list_domain(category: &str, list: &str) -> Domain {
    Domain::new(
        category,
        SelectionFragment::new("array", vec![fields(list, DISK_FIELDS)]),
    )
}

fn capacity_mapping(key: &str, name: &str, column: &str) -> StaticMapping {
    StaticMapping::new(
        format!("array.status.{key}"),
        &["array", "capacity", "kilobytes", column],
        DisplayMetadata::number(name, "value").with_unit("GB"),
    )
    .coerce(coerce::kilobytes_to_gb)
}

/// `used / total` of a `{ free used total }` kilobyte object.
fn capacity_used_percent(raw: &Value) -> Value {
    usage_percent(&raw["used"], &raw["total"]).map_or(Value::Null, Value::from)
}
