//! In-memory provider shared by unit and integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    ExternalProfile, OrgRole, RemoteError, RemoteMembership, RemoteOp, RemoteResult, RepoRef,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, ExternalProfile>,
    org_admins: HashSet<String>,
    invitations: Vec<i64>,
    stars: HashSet<(String, RepoRef)>,
    forks: HashSet<String>,
    failing: HashSet<RemoteOp>,
    calls: Vec<RemoteOp>,
}

/// Scripted GitHub. Credentials map to accounts by token string, and any
/// operation can be made to fail until restored.
#[derive(Default)]
pub struct FakeGithub {
    state: Mutex<State>,
}

impl FakeGithub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(self, credential: &str, id: i64, login: &str) -> Self {
        self.add_account(credential, id, login);
        self
    }

    pub fn add_account(&self, credential: &str, id: i64, login: &str) {
        self.lock().accounts.insert(
            credential.to_string(),
            ExternalProfile {
                id,
                login: login.to_string(),
                email: None,
                name: Some(login.to_uppercase()),
                company: None,
                avatar_url: Some(format!("https://avatars.githubusercontent.com/u/{id}")),
                bio: None,
            },
        );
    }

    /// Lists `login` as an org admin, as if they accepted an invitation.
    pub fn add_org_admin(&self, login: &str) {
        self.lock().org_admins.insert(login.to_string());
    }

    pub fn fail(&self, op: RemoteOp) {
        self.lock().failing.insert(op);
    }

    pub fn restore(&self, op: RemoteOp) {
        self.lock().failing.remove(&op);
    }

    /// Number of times `op` was attempted, failed attempts included.
    pub fn calls(&self, op: RemoteOp) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn invitations(&self) -> Vec<i64> {
        self.lock().invitations.clone()
    }

    pub fn has_fork(&self, location: &str) -> bool {
        self.lock().forks.contains(location)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self, op: RemoteOp) -> RemoteResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(op);
        if state.failing.contains(&op) {
            return Err(RemoteError::Unavailable("503 Service Unavailable".to_string()));
        }
        Ok(state)
    }
}

impl State {
    fn login_for(&self, credential: &str) -> RemoteResult<String> {
        self.accounts
            .get(credential)
            .map(|profile| profile.login.clone())
            .ok_or(RemoteError::Unauthorized)
    }
}

#[async_trait]
impl RemoteMembership for FakeGithub {
    async fn fetch_identity(&self, credential: &str) -> RemoteResult<ExternalProfile> {
        let state = self.enter(RemoteOp::FetchIdentity)?;
        state
            .accounts
            .get(credential)
            .cloned()
            .ok_or(RemoteError::Unauthorized)
    }

    async fn list_org_members(
        &self,
        credential: &str,
        role: OrgRole,
    ) -> RemoteResult<HashSet<String>> {
        let state = self.enter(RemoteOp::ListMembers)?;
        state.login_for(credential)?;
        Ok(match role {
            OrgRole::Admin => state.org_admins.clone(),
            OrgRole::Member => HashSet::new(),
        })
    }

    async fn invite_member(&self, credential: &str, external_id: i64) -> RemoteResult<()> {
        let mut state = self.enter(RemoteOp::Invite)?;
        state.login_for(credential)?;
        state.invitations.push(external_id);
        Ok(())
    }

    async fn revoke_member(&self, credential: &str, username: &str) -> RemoteResult<()> {
        let mut state = self.enter(RemoteOp::Revoke)?;
        state.login_for(credential)?;
        state.org_admins.remove(username);
        Ok(())
    }

    async fn star_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()> {
        let mut state = self.enter(RemoteOp::Star)?;
        let login = state.login_for(credential)?;
        state.stars.insert((login, item.clone()));
        Ok(())
    }

    async fn unstar_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()> {
        let mut state = self.enter(RemoteOp::Unstar)?;
        let login = state.login_for(credential)?;
        state.stars.remove(&(login, item.clone()));
        Ok(())
    }

    async fn fork_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<String> {
        let mut state = self.enter(RemoteOp::Fork)?;
        let login = state.login_for(credential)?;
        let location = format!("https://github.com/{login}/{}", item.name);
        state.forks.insert(location.clone());
        Ok(location)
    }

    async fn delete_fork(&self, credential: &str, forked_location: &str) -> RemoteResult<()> {
        let mut state = self.enter(RemoteOp::DeleteFork)?;
        state.login_for(credential)?;
        if state.forks.remove(forked_location) {
            Ok(())
        } else {
            Err(RemoteError::NotFound)
        }
    }

    async fn get_star_count(&self, item: &RepoRef) -> RemoteResult<i64> {
        let state = self.enter(RemoteOp::StarCount)?;
        Ok(state.stars.iter().filter(|(_, repo)| repo == item).count() as i64)
    }
}
