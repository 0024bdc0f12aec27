//! Role definitions and the process-wide role registry.
//!
//! Roles are static data: a scope set, a global-access flag and a priority.
//! The registry is built once and never mutated; a reload builds a new
//! registry and installs it through [`RoleRegistryHandle`].

mod handle;
mod registry;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use handle::RoleRegistryHandle;
pub use registry::RoleRegistry;

/// A role members can hold within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable key stored on memberships, e.g. `"owner"`.
    pub id: String,
    /// Human-readable name. Defaults to the id when loaded without one.
    #[serde(default)]
    pub name: String,
    /// Permission scopes granted by this role.
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    /// Holders see every team in the organization without assignment.
    #[serde(default)]
    pub is_global: bool,
    /// Rank used for "can this role manage that role" checks.
    pub priority: i32,
}

impl Role {
    pub fn new<I, S>(id: &str, priority: i32, is_global: bool, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            scopes: scopes.into_iter().map(Into::into).collect(),
            is_global,
            priority,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        name.clone_into(&mut self.name);
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Whether a holder of `manager` may grant, change or revoke `target`.
///
/// A role manages every role of equal or lower priority.
pub fn can_manage(manager: &Role, target: &Role) -> bool {
    manager.priority >= target.priority
}
