use std::collections::BTreeSet;

use crate::MembershipError;
use crate::audit::{MemberAuditSnapshot, snapshot};
use crate::members::{MemberLookup, MembershipResolver, MembershipStore, OrganizationMember};
use crate::roles::RoleRegistryHandle;

/// Everything the request layer needs to authorize a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub member_id: i64,
    pub role: String,
    pub is_pending: bool,
    pub scopes: BTreeSet<String>,
    /// Teams the member can see.
    pub teams: BTreeSet<i64>,
    /// Assignment rows as recorded, for audit entries.
    pub snapshot: MemberAuditSnapshot,
}

impl MemberAccess {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn can_see_team(&self, team_id: i64) -> bool {
        self.teams.contains(&team_id)
    }
}

/// Action to resolve a member's scopes and visible teams.
pub struct ResolveMemberAccessAction<S>
where
    S: MembershipStore,
{
    store: S,
    roles: RoleRegistryHandle,
}

impl<S: MembershipStore> ResolveMemberAccessAction<S> {
    pub fn new(store: S, roles: RoleRegistryHandle) -> Self {
        Self { store, roles }
    }

    /// Resolves access for membership `member_id`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_member_access", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        member_id: i64,
    ) -> Result<MemberAccess, MembershipError> {
        let member = self
            .store
            .get_member(organization_id, member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        self.resolve(member).await
    }

    /// Resolves access for the membership held by `user_id`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_user_access", skip_all, err)
    )]
    pub async fn execute_for_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<MemberAccess, MembershipError> {
        let member = self
            .store
            .find_member(organization_id, MemberLookup::User(user_id))
            .await?
            .ok_or(MembershipError::NotFound)?;

        self.resolve(member).await
    }

    async fn resolve(&self, member: OrganizationMember) -> Result<MemberAccess, MembershipError> {
        let resolver = MembershipResolver::new(self.roles.load());

        let teams = self.store.list_teams(member.organization_id).await?;
        let assignments = self.store.list_assignments(member.id).await?;

        let visible = resolver.accessible_teams(&member, &teams, &assignments)?;
        let scopes = resolver.scopes(&member)?.clone();

        log::debug!(
            target: "orgauth",
            "msg=\"access resolved\", member_id={}, role=\"{}\", teams={}",
            member.id,
            member.role,
            visible.len()
        );

        Ok(MemberAccess {
            member_id: member.id,
            role: member.role.clone(),
            is_pending: member.is_pending(),
            scopes,
            teams: visible,
            snapshot: snapshot(&member, &assignments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::{CreateMember, InMemoryMembershipStore, MemberFlags};

    async fn setup(role: &str) -> (InMemoryMembershipStore, i64) {
        let store = InMemoryMembershipStore::new();
        for team in [10, 11, 12] {
            store.add_team(1, team).unwrap();
        }
        let member = store
            .create_member(CreateMember {
                organization_id: 1,
                user_id: Some(5),
                email: None,
                role: role.to_owned(),
                token: None,
                flags: MemberFlags::default(),
                has_global_access: true,
            })
            .await
            .unwrap();
        store.save_assignment(member.id, 10, true).await.unwrap();
        store.save_assignment(member.id, 11, false).await.unwrap();
        (store, member.id)
    }

    #[tokio::test]
    async fn test_member_sees_active_rows() {
        let (store, member_id) = setup("member").await;
        let action = ResolveMemberAccessAction::new(store, RoleRegistryHandle::default());

        let access = action.execute(1, member_id).await.unwrap();

        assert_eq!(access.teams.iter().copied().collect::<Vec<_>>(), [10]);
        assert!(access.can_see_team(10));
        assert!(!access.can_see_team(11));
        assert!(!access.has_scope("org:admin"));
        assert!(!access.is_pending);
        assert_eq!(access.snapshot.team_ids, vec![10]);
    }

    #[tokio::test]
    async fn test_owner_sees_every_team() {
        let (store, _) = setup("owner").await;
        let action = ResolveMemberAccessAction::new(store, RoleRegistryHandle::default());

        let access = action.execute_for_user(1, 5).await.unwrap();

        assert_eq!(
            access.teams.iter().copied().collect::<Vec<_>>(),
            [10, 11, 12]
        );
        assert!(access.has_scope("org:admin"));
        // the audit view still reflects rows only
        assert_eq!(access.snapshot.team_ids, vec![10]);
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let (store, _) = setup("member").await;
        let action = ResolveMemberAccessAction::new(store, RoleRegistryHandle::default());

        assert_eq!(
            action.execute(1, 999).await.unwrap_err(),
            MembershipError::NotFound
        );
        assert_eq!(
            action.execute_for_user(2, 5).await.unwrap_err(),
            MembershipError::NotFound
        );
    }

    #[tokio::test]
    async fn test_role_removed_from_registry() {
        let (store, member_id) = setup("member").await;
        let roles = RoleRegistryHandle::default();
        let action = ResolveMemberAccessAction::new(store, roles.clone());

        let table = r#"{"default_role": "viewer", "roles": [
            {"id": "viewer", "scopes": ["org:read"], "is_global": false, "priority": 0}
        ]}"#;
        roles.install(crate::RoleRegistry::from_json(table).unwrap());

        assert_eq!(
            action.execute(1, member_id).await.unwrap_err(),
            MembershipError::UnknownRole("member".to_owned())
        );
    }
}
