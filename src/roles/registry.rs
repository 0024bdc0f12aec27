use std::collections::HashMap;

use serde::Deserialize;

use super::{Role, can_manage};
use crate::MembershipError;

/// Read-only lookup table of roles.
///
/// Lookups of unknown ids fail with [`MembershipError::UnknownRole`]; they are
/// never coerced to the default role.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    /// Sorted by ascending priority, load order kept for ties.
    roles: Vec<Role>,
    index: HashMap<String, usize>,
    default_index: usize,
}

#[derive(Deserialize)]
struct RoleTable {
    default_role: String,
    roles: Vec<Role>,
}

impl RoleRegistry {
    /// Builds a registry from a role table.
    ///
    /// # Errors
    ///
    /// Returns `MembershipError::Configuration` if the table is empty, an id is
    /// blank or repeated, or `default_role` is not in the table.
    pub fn new(roles: Vec<Role>, default_role: &str) -> Result<Self, MembershipError> {
        if roles.is_empty() {
            return Err(MembershipError::Configuration(
                "role table is empty".to_owned(),
            ));
        }

        let mut roles = roles;
        roles.sort_by_key(|r| r.priority);

        let mut index = HashMap::with_capacity(roles.len());
        for (position, role) in roles.iter_mut().enumerate() {
            if role.id.trim().is_empty() {
                return Err(MembershipError::Configuration(
                    "role id must not be blank".to_owned(),
                ));
            }
            if role.name.is_empty() {
                role.name.clone_from(&role.id);
            }
            if index.insert(role.id.clone(), position).is_some() {
                return Err(MembershipError::Configuration(format!(
                    "duplicate role id: {}",
                    role.id
                )));
            }
        }

        let default_index = *index.get(default_role).ok_or_else(|| {
            MembershipError::Configuration(format!("default role not in table: {default_role}"))
        })?;

        log::debug!(
            target: "orgauth",
            "msg=\"role registry built\", roles={}, default_role=\"{}\"",
            roles.len(),
            default_role
        );

        Ok(Self {
            roles,
            index,
            default_index,
        })
    }

    /// Loads a registry from JSON.
    ///
    /// Format: `{"default_role": "member", "roles": [{"id": "member",
    /// "scopes": ["org:read"], "is_global": false, "priority": 0}]}`
    pub fn from_json(json: &str) -> Result<Self, MembershipError> {
        let table: RoleTable = serde_json::from_str(json)
            .map_err(|e| MembershipError::Configuration(format!("invalid role table: {e}")))?;
        Self::new(table.roles, &table.default_role)
    }

    /// The stock four-role table: member, admin, manager, owner.
    ///
    /// `member` is the default and the only non-global role.
    pub fn builtin() -> Self {
        const MEMBER_SCOPES: &[&str] = &[
            "event:read",
            "event:write",
            "event:admin",
            "project:releases",
            "project:read",
            "org:read",
            "member:read",
            "team:read",
        ];
        const ADMIN_SCOPES: &[&str] =
            &["team:write", "team:admin", "project:write", "project:admin"];
        const MANAGER_SCOPES: &[&str] = &["member:write", "member:admin", "org:write"];
        const OWNER_SCOPES: &[&str] = &["org:admin"];

        let member: Vec<&str> = MEMBER_SCOPES.to_vec();
        let admin: Vec<&str> = [MEMBER_SCOPES, ADMIN_SCOPES].concat();
        let manager: Vec<&str> = [MEMBER_SCOPES, ADMIN_SCOPES, MANAGER_SCOPES].concat();
        let owner: Vec<&str> = [MEMBER_SCOPES, ADMIN_SCOPES, MANAGER_SCOPES, OWNER_SCOPES].concat();

        let roles = vec![
            Role::new("member", 0, false, member).with_name("Member"),
            Role::new("admin", 1, true, admin).with_name("Admin"),
            Role::new("manager", 2, true, manager).with_name("Manager"),
            Role::new("owner", 3, true, owner).with_name("Owner"),
        ];

        // the table above is static and satisfies every check in `new`
        #[allow(clippy::expect_used)]
        Self::new(roles, "member").expect("builtin role table is valid")
    }

    /// Looks up a role by id.
    pub fn get(&self, role_id: &str) -> Result<&Role, MembershipError> {
        self.index
            .get(role_id)
            .map(|&i| &self.roles[i])
            .ok_or_else(|| MembershipError::UnknownRole(role_id.to_owned()))
    }

    pub fn contains(&self, role_id: &str) -> bool {
        self.index.contains_key(role_id)
    }

    pub fn default_role(&self) -> &Role {
        &self.roles[self.default_index]
    }

    /// All roles in ascending priority order.
    pub fn choices(&self) -> &[Role] {
        &self.roles
    }

    /// Resolves an optional role id, using the default role when absent.
    pub fn resolve(&self, role_id: Option<&str>) -> Result<&Role, MembershipError> {
        match role_id {
            Some(id) => self.get(id),
            None => Ok(self.default_role()),
        }
    }

    /// [`can_manage`] over role ids.
    pub fn can_manage(&self, manager_id: &str, target_id: &str) -> Result<bool, MembershipError> {
        Ok(can_manage(self.get(manager_id)?, self.get(target_id)?))
    }

    /// Roles that a holder of `manager_id` may hand out.
    pub fn manageable_by(&self, manager_id: &str) -> Result<Vec<&Role>, MembershipError> {
        let manager = self.get(manager_id)?;
        Ok(self
            .roles
            .iter()
            .filter(|r| can_manage(manager, r))
            .collect())
    }
}
