#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::repository::{InviteSender, UserDirectory};
use super::types::User;
use crate::MembershipError;

/// Records invites and SSO link requests instead of sending them.
#[derive(Clone, Default)]
pub struct MockInviteSender {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub sso_links: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl MockInviteSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(email, invite_link)` pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// `(email, link)` pairs of SSO re-link requests delivered so far.
    pub fn sso_links(&self) -> Vec<(String, String)> {
        self.sso_links.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), MembershipError> {
        if self.fail {
            return Err(MembershipError::StoreUnavailable(
                "mail relay unreachable".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InviteSender for MockInviteSender {
    async fn send_invite(&self, email: &str, invite_link: &str) -> Result<(), MembershipError> {
        self.check()?;
        self.sent
            .lock()
            .unwrap()
            .push((email.to_owned(), invite_link.to_owned()));
        Ok(())
    }

    async fn send_sso_link(&self, email: &str, link: &str) -> Result<(), MembershipError> {
        self.check()?;
        self.sso_links
            .lock()
            .unwrap()
            .push((email.to_owned(), link.to_owned()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockUserDirectory {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, MembershipError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }
}
