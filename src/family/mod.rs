//! Unraid resource families.
//!
//! One [`ResourceFamily`] per response list whose members get their own
//! sub-tree. Identity and labeling rules differ per family; everything else
//! is handled by the reconciler.

mod container;
mod cpu;
mod disk;
mod share;
mod vm;

pub use container::Containers;
pub use cpu::CpuCores;
pub use disk::{DeviceList, DeviceRole};
pub use share::Shares;
pub use vm::VirtualMachines;

use reconcile::ResourceFamily;
use serde_json::Value;

/// Every family the mirror knows, in reconciliation order.
pub fn all() -> Vec<Box<dyn ResourceFamily>> {
    vec![
        Box::new(CpuCores),
        Box::new(DeviceList::new(DeviceRole::Data)),
        Box::new(DeviceList::new(DeviceRole::Parity)),
        Box::new(DeviceList::new(DeviceRole::Cache)),
        Box::new(Containers),
        Box::new(VirtualMachines),
        Box::new(Shares),
    ]
}

/// Identity of a member from an explicit index field, else its position.
pub(crate) fn index_or_position(member: &Value, key: &str, position: usize) -> String {
    match &member[key] {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => position.to_string(),
    }
}
