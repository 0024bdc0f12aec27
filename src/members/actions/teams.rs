use chrono::Utc;

use crate::MembershipError;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{MembershipStore, OrganizationMemberTeam};

#[derive(Debug, Clone, Copy)]
pub struct SetTeamAssignmentInput {
    pub organization_id: i64,
    pub member_id: i64,
    pub team_id: i64,
    pub is_active: bool,
}

/// Action to join a member to a team, or toggle an existing assignment.
///
/// Deactivating keeps the row so the member can rejoin later.
pub struct SetTeamAssignmentAction<S>
where
    S: MembershipStore,
{
    store: S,
}

impl<S: MembershipStore> SetTeamAssignmentAction<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upserts the `(member, team)` row.
    ///
    /// Fails with `NotFound` when the member or the team is not part of the
    /// organization.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "set_team_assignment", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: SetTeamAssignmentInput,
    ) -> Result<OrganizationMemberTeam, MembershipError> {
        let member = self
            .store
            .get_member(input.organization_id, input.member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        if !self
            .store
            .list_teams(input.organization_id)
            .await?
            .contains(&input.team_id)
        {
            return Err(MembershipError::NotFound);
        }

        let row = self
            .store
            .save_assignment(member.id, input.team_id, input.is_active)
            .await?;

        dispatch(MembershipEvent::TeamAssignmentChanged {
            organization_id: input.organization_id,
            member_id: member.id,
            team_id: row.team_id,
            is_active: row.is_active,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"team assignment saved\", member_id={}, team_id={}, is_active={}",
            member.id,
            row.team_id,
            row.is_active
        );

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::{CreateMember, InMemoryMembershipStore, MemberFlags};

    async fn setup() -> (InMemoryMembershipStore, i64) {
        let store = InMemoryMembershipStore::new();
        store.add_team(1, 10).unwrap();
        store.add_team(2, 20).unwrap();
        let member = store
            .create_member(CreateMember {
                organization_id: 1,
                user_id: Some(5),
                email: None,
                role: "member".to_owned(),
                token: None,
                flags: MemberFlags::default(),
                has_global_access: true,
            })
            .await
            .unwrap();
        (store, member.id)
    }

    fn input(member_id: i64, team_id: i64, is_active: bool) -> SetTeamAssignmentInput {
        SetTeamAssignmentInput {
            organization_id: 1,
            member_id,
            team_id,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_toggle_keeps_single_row() {
        let (store, member_id) = setup().await;
        let action = SetTeamAssignmentAction::new(store.clone());

        let joined = action.execute(input(member_id, 10, true)).await.unwrap();
        let left = action.execute(input(member_id, 10, false)).await.unwrap();

        assert_eq!(joined.id, left.id);
        assert!(!left.is_active);
        assert_eq!(store.assignment_count(), 1);

        let rows = store.list_assignments(member_id).await.unwrap();
        assert_eq!(rows, vec![left]);
    }

    #[tokio::test]
    async fn test_team_from_other_org() {
        let (store, member_id) = setup().await;
        let action = SetTeamAssignmentAction::new(store.clone());

        assert_eq!(
            action
                .execute(input(member_id, 20, true))
                .await
                .unwrap_err(),
            MembershipError::NotFound
        );
        assert_eq!(store.assignment_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let (store, _) = setup().await;
        let action = SetTeamAssignmentAction::new(store);

        assert_eq!(
            action.execute(input(999, 10, true)).await.unwrap_err(),
            MembershipError::NotFound
        );
    }
}
