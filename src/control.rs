//! Container and VM control mutations.

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde_json::{Value, json};
use std::fmt;

/// What kind of resource a control action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ControlTarget {
    Container,
    Vm,
}

impl ControlTarget {
    /// Root field of the mutation
    fn root(self) -> &'static str {
        match self {
            Self::Container => "docker",
            Self::Vm => "vm",
        }
    }
}

impl fmt::Display for ControlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Vm => write!(f, "vm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ControlAction {
    Start,
    Stop,
    Pause,
    Resume,
    ForceStop,
    Reboot,
}

impl ControlAction {
    /// GraphQL field name of the action
    fn field(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::ForceStop => "forceStop",
            Self::Reboot => "reboot",
        }
    }

    /// Whether `target` supports this action
    pub fn supports(self, target: ControlTarget) -> bool {
        match target {
            ControlTarget::Container => matches!(self, Self::Start | Self::Stop),
            ControlTarget::Vm => true,
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForceStop => write!(f, "force-stop"),
            other => write!(f, "{}", other.field()),
        }
    }
}

/// A control request ready to be sent as a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub target: ControlTarget,
    pub action: ControlAction,
    /// Server-side id (`PrefixedID`), not the mirrored path segment
    pub id: String,
}

impl ControlRequest {
    pub fn new(target: ControlTarget, action: ControlAction, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            bail!("{target} id must not be empty");
        }
        if !action.supports(target) {
            bail!("Action '{action}' is not supported for a {target}");
        }
        Ok(Self { target, action, id })
    }

    /// The mutation document
    pub fn mutation(&self) -> String {
        let root = self.target.root();
        let field = self.action.field();
        match self.target {
            // Container mutations return the container; VM mutations a bool
            ControlTarget::Container => format!(
                "mutation ($id: PrefixedID!) {{ {root} {{ {field}(id: $id) {{ id state }} }} }}"
            ),
            ControlTarget::Vm => {
                format!("mutation ($id: PrefixedID!) {{ {root} {{ {field}(id: $id) }} }}")
            }
        }
    }

    pub fn variables(&self) -> Value {
        json!({ "id": self.id })
    }

    /// Check the mutation result, failing when a VM action reports `false`
    pub fn check_response(&self, data: &Value) -> Result<()> {
        let result = &data[self.target.root()][self.action.field()];
        match result {
            Value::Null => bail!("Server returned no result for {} {}", self.target, self.action),
            Value::Bool(false) => bail!("Server rejected {} {} for '{}'", self.target, self.action, self.id),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_mutation() {
        let request = ControlRequest::new(ControlTarget::Container, ControlAction::Start, "abc:plex").unwrap();
        assert_eq!(
            request.mutation(),
            "mutation ($id: PrefixedID!) { docker { start(id: $id) { id state } } }"
        );
        assert_eq!(request.variables(), json!({"id": "abc:plex"}));
    }

    #[test]
    fn test_vm_mutation() {
        let request = ControlRequest::new(ControlTarget::Vm, ControlAction::ForceStop, "vm-1").unwrap();
        assert_eq!(request.mutation(), "mutation ($id: PrefixedID!) { vm { forceStop(id: $id) } }");
    }

    #[test]
    fn test_unsupported_combination() {
        let err = ControlRequest::new(ControlTarget::Container, ControlAction::Reboot, "x").unwrap_err();
        assert!(err.to_string().contains("not supported"));
        assert!(ControlRequest::new(ControlTarget::Vm, ControlAction::Start, " ").is_err());
    }

    #[test]
    fn test_check_response() {
        let vm = ControlRequest::new(ControlTarget::Vm, ControlAction::Pause, "vm-1").unwrap();
        assert!(vm.check_response(&json!({"vm": {"pause": true}})).is_ok());
        assert!(vm.check_response(&json!({"vm": {"pause": false}})).is_err());
        assert!(vm.check_response(&json!({})).is_err());

        let container = ControlRequest::new(ControlTarget::Container, ControlAction::Stop, "c1").unwrap();
        let data = json!({"docker": {"stop": {"id": "c1", "state": "EXITED"}}});
        assert!(container.check_response(&data).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(ControlAction::ForceStop.to_string(), "force-stop");
        assert_eq!(ControlTarget::Vm.to_string(), "vm");
    }
}
