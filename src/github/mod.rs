//! Contract with the remote provider that owns identities, org membership,
//! stars and forks. The core only talks to [`RemoteMembership`]; the
//! [`GithubClient`] is the production implementation.

mod client;

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use client::GithubClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote rejected credential")]
    Unauthorized,

    #[error("remote conflict: {0}")]
    Conflict(String),

    #[error("remote resource not found")]
    NotFound,
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The remote call that failed, used to pick a stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    FetchIdentity,
    ListMembers,
    Invite,
    Revoke,
    Star,
    Unstar,
    StarCount,
    Fork,
    DeleteFork,
}

impl RemoteOp {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            RemoteOp::Star => "GITHUB_STARRED_API_FAIL",
            RemoteOp::Unstar => "GITHUB_UNSTARRED_API_FAIL",
            _ => "GITHUB_API_FAIL",
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::FetchIdentity => "fetch identity",
            RemoteOp::ListMembers => "list org members",
            RemoteOp::Invite => "invite member",
            RemoteOp::Revoke => "revoke member",
            RemoteOp::Star => "star",
            RemoteOp::Unstar => "unstar",
            RemoteOp::StarCount => "get star count",
            RemoteOp::Fork => "fork",
            RemoteOp::DeleteFork => "delete fork",
        };
        f.write_str(name)
    }
}

/// Org membership role filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Admin,
    Member,
}

impl OrgRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }
}

/// Profile returned by the provider for a credential.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalProfile {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

const GITHUB_WEB_PREFIX: &str = "https://github.com/";

/// `owner/name` of a repository on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parses `https://github.com/{owner}/{name}` (trailing slash and `.git` tolerated).
    pub fn from_url(url: &str) -> Option<RepoRef> {
        let path = url.trim().strip_prefix(GITHUB_WEB_PREFIX)?;
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let (owner, name) = path.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }

        Some(RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Remote system of record. Calls are never retried; one failure is surfaced as-is.
#[async_trait]
pub trait RemoteMembership: Send + Sync {
    async fn fetch_identity(&self, credential: &str) -> RemoteResult<ExternalProfile>;

    async fn list_org_members(
        &self,
        credential: &str,
        role: OrgRole,
    ) -> RemoteResult<HashSet<String>>;

    async fn invite_member(&self, credential: &str, external_id: i64) -> RemoteResult<()>;

    async fn revoke_member(&self, credential: &str, username: &str) -> RemoteResult<()>;

    async fn star_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()>;

    async fn unstar_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()>;

    /// Returns the web URL of the fork.
    async fn fork_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<String>;

    async fn delete_fork(&self, credential: &str, forked_location: &str) -> RemoteResult<()>;

    async fn get_star_count(&self, item: &RepoRef) -> RemoteResult<i64>;
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fake;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_from_url() {
        let r = RepoRef::from_url("https://github.com/prometheus/node_exporter").unwrap();
        assert_eq!(r.owner, "prometheus");
        assert_eq!(r.name, "node_exporter");
        assert_eq!(r.to_string(), "prometheus/node_exporter");

        let r = RepoRef::from_url("https://github.com/a/b.git/").unwrap();
        assert_eq!(r.name, "b");
    }

    #[test]
    fn test_repo_ref_rejects_other_urls() {
        assert!(RepoRef::from_url("https://gitlab.com/a/b").is_none());
        assert!(RepoRef::from_url("https://github.com/onlyowner").is_none());
        assert!(RepoRef::from_url("https://github.com/a/b/tree/main").is_none());
    }

    #[test]
    fn test_remote_op_codes() {
        assert_eq!(RemoteOp::Star.code(), "GITHUB_STARRED_API_FAIL");
        assert_eq!(RemoteOp::Unstar.code(), "GITHUB_UNSTARRED_API_FAIL");
        assert_eq!(RemoteOp::Fork.code(), "GITHUB_API_FAIL");
        assert_eq!(RemoteOp::StarCount.code(), "GITHUB_API_FAIL");
    }
}
