//! Project member listing.
//!
//! Lists the users behind a project's organization memberships, decorated
//! with avatar, two-factor and identity data from a [`ProfileSource`].

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::MembershipError;
use crate::config::{OrgConfig, StacktraceOrder, UserOptionsDefaults};
use crate::members::{MembershipResolver, MembershipStore, Project, User, UserDirectory};
use crate::roles::RoleRegistryHandle;

const GRAVATAR_BASE: &str = "https://secure.gravatar.com/avatar";
const GRAVATAR_SIZE: u32 = 32;

/// Profile decoration for listed users.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Uploaded or chosen avatars. Users without an entry get a letter avatar.
    async fn avatars(&self, user_ids: &[i64]) -> Result<HashMap<i64, Avatar>, MembershipError>;

    /// Users with at least one enrolled second factor.
    async fn users_with_2fa(&self, user_ids: &[i64]) -> Result<HashSet<i64>, MembershipError>;

    async fn identities(
        &self,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<LinkedIdentity>>, MembershipError>;

    /// Account-wide display options the user has saved.
    async fn user_options(&self, user_id: i64) -> Result<StoredUserOptions, MembershipError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub avatar_type: String,
    pub avatar_uuid: Option<String>,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            avatar_type: "letter_avatar".to_owned(),
            avatar_uuid: None,
        }
    }
}

/// An external account linked through an organization's auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedIdentity {
    pub id: String,
    /// Identifier at the provider.
    pub name: String,
    pub organization: IdentityOrganization,
    pub provider: IdentityProvider,
    pub date_synced: DateTime<Utc>,
    pub date_verified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityOrganization {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub id: String,
    pub name: String,
}

/// Options as stored; `None` means never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredUserOptions {
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// `1` newest last, `2` newest first, anything else default.
    pub stacktrace_order: Option<i32>,
    pub clock_24_hours: Option<bool>,
}

/// Effective display options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOptions {
    pub language: String,
    pub stacktrace_order: StacktraceOrder,
    pub timezone: String,
    pub clock_24_hours: bool,
}

impl UserOptions {
    /// Fills unset or empty values from `defaults`.
    pub fn resolve(stored: StoredUserOptions, defaults: &UserOptionsDefaults) -> Self {
        Self {
            language: stored
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| defaults.language.clone()),
            stacktrace_order: stored
                .stacktrace_order
                .map_or(defaults.stacktrace_order, StacktraceOrder::from_stored),
            timezone: stored
                .timezone
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| defaults.timezone.clone()),
            clock_24_hours: stored.clock_24_hours.unwrap_or(defaults.clock_24_hours),
        }
    }
}

/// One listed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub is_active: bool,
    pub is_managed: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub has_2fa: bool,
    pub avatar: Avatar,
    /// Present for superusers and on the viewer's own row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<LinkedIdentity>>,
    /// Present on the viewer's own row only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<UserOptions>,
}

/// Who is asking for the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub is_superuser: bool,
}

impl Viewer {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_superuser: false,
        }
    }

    pub fn superuser(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_superuser: true,
        }
    }

    fn is(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Gravatar URL for `email` at 32px.
///
/// The address is trimmed and lowercased before hashing.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "{GRAVATAR_BASE}/{}?s={GRAVATAR_SIZE}&d=mm",
        hex::encode(digest)
    )
}

/// Action to list the users of a project's organization.
pub struct ListProjectMembersAction<S, U, P>
where
    S: MembershipStore,
    U: UserDirectory,
    P: ProfileSource,
{
    store: S,
    users: U,
    profiles: P,
    roles: RoleRegistryHandle,
    defaults: UserOptionsDefaults,
}

impl<S, U, P> ListProjectMembersAction<S, U, P>
where
    S: MembershipStore,
    U: UserDirectory,
    P: ProfileSource,
{
    pub fn new(store: S, users: U, profiles: P, roles: RoleRegistryHandle) -> Self {
        Self {
            store,
            users,
            profiles,
            roles,
            defaults: UserOptionsDefaults::default(),
        }
    }

    /// Uses the option defaults of `config`, such as its timezone.
    pub fn with_config(
        store: S,
        users: U,
        profiles: P,
        roles: RoleRegistryHandle,
        config: &OrgConfig,
    ) -> Self {
        Self {
            store,
            users,
            profiles,
            roles,
            defaults: config.user_options.clone(),
        }
    }

    /// Lists active users holding an accepted membership in the project's
    /// organization, sorted by email and then id.
    ///
    /// With `team_filter`, only members who can see that team are kept.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_project_members", skip_all, err)
    )]
    pub async fn execute(
        &self,
        project: &Project,
        viewer: &Viewer,
        team_filter: Option<i64>,
    ) -> Result<Vec<MemberUser>, MembershipError> {
        let members = self.store.list_members(project.organization_id).await?;

        let mut user_ids = Vec::with_capacity(members.len());
        match team_filter {
            None => user_ids.extend(members.iter().filter_map(|m| m.user_id)),
            Some(team_id) => {
                let resolver = MembershipResolver::new(self.roles.load());
                let teams = self.store.list_teams(project.organization_id).await?;
                for member in &members {
                    let Some(user_id) = member.user_id else {
                        continue;
                    };
                    let assignments = self.store.list_assignments(member.id).await?;
                    if resolver
                        .accessible_teams(member, &teams, &assignments)?
                        .contains(&team_id)
                    {
                        user_ids.push(user_id);
                    }
                }
            }
        }

        let mut users: Vec<User> = self
            .users
            .find_users(&user_ids)
            .await?
            .into_iter()
            .filter(|u| u.is_active)
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email).then(a.id.cmp(&b.id)));
        users.dedup_by_key(|u| u.id);

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut avatars = self.profiles.avatars(&ids).await?;
        let with_2fa = self.profiles.users_with_2fa(&ids).await?;

        let identity_ids: Vec<i64> = if viewer.is_superuser {
            ids.clone()
        } else {
            ids.iter().copied().filter(|id| viewer.is(*id)).collect()
        };
        let mut identities = if identity_ids.is_empty() {
            HashMap::new()
        } else {
            self.profiles.identities(&identity_ids).await?
        };

        let options = match viewer.user_id.filter(|id| ids.contains(id)) {
            Some(id) => Some(UserOptions::resolve(
                self.profiles.user_options(id).await?,
                &self.defaults,
            )),
            None => None,
        };

        log::debug!(
            target: "orgauth",
            "msg=\"project members listed\", project_id={}, organization_id={}, count={}",
            project.id,
            project.organization_id,
            users.len()
        );

        Ok(users
            .into_iter()
            .map(|user| {
                let identities = identity_ids
                    .contains(&user.id)
                    .then(|| identities.remove(&user.id).unwrap_or_default());
                let options = if viewer.is(user.id) {
                    options.clone()
                } else {
                    None
                };
                MemberUser {
                    id: user.id.to_string(),
                    name: user.display_name().to_owned(),
                    avatar_url: gravatar_url(&user.email),
                    has_2fa: with_2fa.contains(&user.id),
                    avatar: avatars.remove(&user.id).unwrap_or_default(),
                    identities,
                    options,
                    username: user.username,
                    email: user.email,
                    is_active: user.is_active,
                    is_managed: user.is_managed,
                    date_joined: user.date_joined,
                    last_login: user.last_login,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::{CreateMember, InMemoryMembershipStore, MemberFlags, MockUserDirectory};

    #[derive(Default)]
    struct Profiles {
        avatars: HashMap<i64, Avatar>,
        with_2fa: HashSet<i64>,
        identities: HashMap<i64, Vec<LinkedIdentity>>,
        options: HashMap<i64, StoredUserOptions>,
    }

    #[async_trait]
    impl ProfileSource for Profiles {
        async fn avatars(&self, user_ids: &[i64]) -> Result<HashMap<i64, Avatar>, MembershipError> {
            Ok(self
                .avatars
                .iter()
                .filter(|(id, _)| user_ids.contains(id))
                .map(|(id, a)| (*id, a.clone()))
                .collect())
        }

        async fn users_with_2fa(&self, user_ids: &[i64]) -> Result<HashSet<i64>, MembershipError> {
            Ok(self
                .with_2fa
                .iter()
                .copied()
                .filter(|id| user_ids.contains(id))
                .collect())
        }

        async fn identities(
            &self,
            user_ids: &[i64],
        ) -> Result<HashMap<i64, Vec<LinkedIdentity>>, MembershipError> {
            Ok(self
                .identities
                .iter()
                .filter(|(id, _)| user_ids.contains(id))
                .map(|(id, v)| (*id, v.clone()))
                .collect())
        }

        async fn user_options(&self, user_id: i64) -> Result<StoredUserOptions, MembershipError> {
            Ok(self.options.get(&user_id).cloned().unwrap_or_default())
        }
    }

    fn identity(id: &str) -> LinkedIdentity {
        LinkedIdentity {
            id: id.to_owned(),
            name: "jane@corp".to_owned(),
            organization: IdentityOrganization {
                slug: "acme".to_owned(),
                name: "Acme".to_owned(),
            },
            provider: IdentityProvider {
                id: "okta".to_owned(),
                name: "Okta".to_owned(),
            },
            date_synced: Utc::now(),
            date_verified: Utc::now(),
        }
    }

    fn project() -> Project {
        Project {
            id: 7,
            organization_id: 1,
            slug: "backend".to_owned(),
            name: "Backend".to_owned(),
        }
    }

    fn linked(user_id: i64, role: &str) -> CreateMember {
        CreateMember {
            organization_id: 1,
            user_id: Some(user_id),
            email: None,
            role: role.to_owned(),
            token: None,
            flags: MemberFlags::default(),
            has_global_access: true,
        }
    }

    async fn setup(
        profiles: Profiles,
    ) -> ListProjectMembersAction<InMemoryMembershipStore, MockUserDirectory, Profiles> {
        setup_with(profiles, &OrgConfig::development()).await
    }

    async fn setup_with(
        profiles: Profiles,
        config: &OrgConfig,
    ) -> ListProjectMembersAction<InMemoryMembershipStore, MockUserDirectory, Profiles> {
        let store = InMemoryMembershipStore::new();
        store.add_team(1, 10).unwrap();

        let carol = store.create_member(linked(3, "member")).await.unwrap();
        store.create_member(linked(1, "owner")).await.unwrap();
        store.create_member(linked(2, "member")).await.unwrap();
        store.create_member(linked(4, "member")).await.unwrap();
        store
            .create_member(CreateMember {
                user_id: None,
                email: Some("pending@x.com".to_owned()),
                ..linked(0, "member")
            })
            .await
            .unwrap();
        store.save_assignment(carol.id, 10, true).await.unwrap();

        let mut inactive = User::mock(4, "dave@x.com");
        inactive.is_active = false;
        let users = MockUserDirectory::with_users(vec![
            User::mock(1, "alice@x.com"),
            User::mock(2, "bob@x.com"),
            User::mock(3, "carol@x.com"),
            inactive,
            User::mock(9, "outsider@x.com"),
        ]);

        ListProjectMembersAction::with_config(
            store,
            users,
            profiles,
            RoleRegistryHandle::default(),
            config,
        )
    }

    #[tokio::test]
    async fn test_lists_active_linked_users_sorted() {
        let action = setup(Profiles::default()).await;

        let listed = action
            .execute(&project(), &Viewer::default(), None)
            .await
            .unwrap();

        let emails: Vec<_> = listed.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["alice@x.com", "bob@x.com", "carol@x.com"]);
        assert!(listed.iter().all(|u| u.identities.is_none()));
        assert!(listed.iter().all(|u| u.options.is_none()));
        assert_eq!(listed[0].avatar, Avatar::default());
        assert_eq!(listed[0].avatar_url, gravatar_url("alice@x.com"));
    }

    #[tokio::test]
    async fn test_team_filter_uses_accessible_teams() {
        let action = setup(Profiles::default()).await;

        let listed = action
            .execute(&project(), &Viewer::default(), Some(10))
            .await
            .unwrap();

        // owner sees the team through the global role, carol through her row
        let ids: Vec<_> = listed.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test]
    async fn test_own_row_gets_options_and_identities() {
        let mut profiles = Profiles::default();
        profiles.identities.insert(2, vec![identity("i-2")]);
        profiles.identities.insert(3, vec![identity("i-3")]);
        profiles.with_2fa.insert(2);
        profiles.options.insert(
            2,
            StoredUserOptions {
                language: Some("de".to_owned()),
                stacktrace_order: Some(2),
                ..Default::default()
            },
        );
        let action = setup(profiles).await;

        let listed = action
            .execute(&project(), &Viewer::user(2), None)
            .await
            .unwrap();

        let bob = listed.iter().find(|u| u.id == "2").unwrap();
        assert!(bob.has_2fa);
        assert_eq!(bob.identities.as_ref().map(Vec::len), Some(1));
        let options = bob.options.as_ref().unwrap();
        assert_eq!(options.language, "de");
        assert_eq!(options.stacktrace_order, StacktraceOrder::NewestFirst);
        assert_eq!(options.timezone, "UTC");
        assert!(!options.clock_24_hours);

        let carol = listed.iter().find(|u| u.id == "3").unwrap();
        assert!(carol.identities.is_none());
        assert!(carol.options.is_none());
        assert!(!carol.has_2fa);
    }

    #[tokio::test]
    async fn test_configured_timezone_reaches_own_row() {
        let mut config = OrgConfig::development();
        config.user_options.timezone = "Europe/Berlin".to_owned();
        config.user_options.clock_24_hours = true;
        let action = setup_with(Profiles::default(), &config).await;

        let listed = action
            .execute(&project(), &Viewer::user(3), None)
            .await
            .unwrap();

        let carol = listed.iter().find(|u| u.id == "3").unwrap();
        let options = carol.options.as_ref().unwrap();
        assert_eq!(options.timezone, "Europe/Berlin");
        assert!(options.clock_24_hours);
        assert_eq!(options.language, "en");
    }

    #[tokio::test]
    async fn test_default_constructor_uses_utc() {
        let store = InMemoryMembershipStore::new();
        store.create_member(linked(1, "member")).await.unwrap();
        let users = MockUserDirectory::with_users(vec![User::mock(1, "alice@x.com")]);
        let action = ListProjectMembersAction::new(
            store,
            users,
            Profiles::default(),
            RoleRegistryHandle::default(),
        );

        let listed = action
            .execute(&project(), &Viewer::user(1), None)
            .await
            .unwrap();
        assert_eq!(listed[0].options.as_ref().unwrap().timezone, "UTC");
    }

    #[tokio::test]
    async fn test_superuser_sees_all_identities() {
        let mut profiles = Profiles::default();
        profiles.identities.insert(3, vec![identity("i-3")]);
        let action = setup(profiles).await;

        let listed = action
            .execute(&project(), &Viewer::superuser(99), None)
            .await
            .unwrap();

        for user in &listed {
            assert!(user.identities.is_some());
            assert!(user.options.is_none());
        }
        let carol = listed.iter().find(|u| u.id == "3").unwrap();
        assert_eq!(carol.identities.as_ref().unwrap()[0].id, "i-3");
    }

    #[test]
    fn test_user_options_defaults() {
        let defaults = UserOptionsDefaults::default();
        let resolved = UserOptions::resolve(
            StoredUserOptions {
                language: Some(String::new()),
                stacktrace_order: Some(-1),
                ..Default::default()
            },
            &defaults,
        );

        assert_eq!(resolved.language, "en");
        assert_eq!(resolved.stacktrace_order, StacktraceOrder::Default);
        assert_eq!(resolved.timezone, "UTC");

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["stacktraceOrder"], "default");
        assert_eq!(json["clock24Hours"], false);
    }

    #[test]
    fn test_member_user_json_shape() {
        let user = MemberUser {
            id: "1".to_owned(),
            name: "Alice".to_owned(),
            username: "alice".to_owned(),
            email: "alice@x.com".to_owned(),
            avatar_url: gravatar_url("alice@x.com"),
            is_active: true,
            is_managed: false,
            date_joined: Utc::now(),
            last_login: None,
            has_2fa: true,
            avatar: Avatar::default(),
            identities: None,
            options: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["has2fa"], true);
        assert_eq!(json["avatar"]["avatarType"], "letter_avatar");
        assert!(json.get("identities").is_none());
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_gravatar_url_normalizes_email() {
        let url = gravatar_url(" Alice@X.com ");
        assert_eq!(url, gravatar_url("alice@x.com"));
        assert!(url.starts_with("https://secure.gravatar.com/avatar/"));
        assert!(url.ends_with("?s=32&d=mm"));
    }
}
