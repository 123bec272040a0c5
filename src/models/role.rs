//! Role, resource and permission domain models

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Fixed role enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    DataEntry,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::DataEntry => "data_entry",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "data_entry" => Ok(Role::DataEntry),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!(
                "Unknown role '{}'. Must be one of: admin, manager, data_entry, viewer",
                other
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protected resource types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Machines,
    Operators,
    Refuels,
    Settings,
    Users,
    Reports,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Machines,
        Resource::Operators,
        Resource::Refuels,
        Resource::Settings,
        Resource::Users,
        Resource::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Machines => "machines",
            Resource::Operators => "operators",
            Resource::Refuels => "refuels",
            Resource::Settings => "settings",
            Resource::Users => "users",
            Resource::Reports => "reports",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that can be granted on a resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
    Admin,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Write, Action::Delete, Action::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
            Action::Admin => "admin",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user permission override: resource -> allowed actions.
///
/// Replaces the role defaults entirely when present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionOverride(pub BTreeMap<Resource, BTreeSet<Action>>);

impl PermissionOverride {
    /// Parse a stored override blob. Unknown resources or actions make the
    /// whole blob invalid.
    pub fn parse(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        PermissionOverride::deserialize(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Absent resource key means no access.
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.0
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FromIterator<(Resource, Vec<Action>)> for PermissionOverride {
    fn from_iter<I: IntoIterator<Item = (Resource, Vec<Action>)>>(iter: I) -> Self {
        PermissionOverride(
            iter.into_iter()
                .map(|(resource, actions)| (resource, actions.into_iter().collect()))
                .collect(),
        )
    }
}

/// Permission summary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PermissionSummary {
    pub resource: Resource,
    pub actions: Vec<Action>,
}
