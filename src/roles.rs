//! Role lifecycle: login sync, pending-admin reconciliation, elevation and revocation.
//!
//! Every remote call happens before the local write it guards, so a remote
//! failure leaves stored roles exactly as they were.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::github::{ExternalProfile, OrgRole, RemoteMembership, RemoteOp};
use crate::store::Store;
use crate::types::{NewUser, Role, User};

/// Authenticates a provider credential and returns the local identity,
/// creating it on first login and refreshing provider-owned fields otherwise.
pub async fn login(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    credential: &str,
) -> Result<User> {
    let profile = remote
        .fetch_identity(credential)
        .await
        .map_err(Error::remote(RemoteOp::FetchIdentity))?;

    let Some(mut user) = store.get_user_by_github_id(profile.id)? else {
        let user = store.create_user(&new_user(&profile, credential))?;
        info!("Registered '{}' as {}", user.username, user.role);
        return Ok(user);
    };

    // A pending admin only checks its own membership, not every pending row.
    let promote = if user.role == Role::PendingAdmin {
        let admins = remote
            .list_org_members(credential, OrgRole::Admin)
            .await
            .map_err(Error::remote(RemoteOp::ListMembers))?;
        admins.contains(&profile.login)
    } else {
        false
    };

    user.username = profile.login;
    user.profile_image_url = profile.avatar_url;
    user.intro = profile.bio;
    user.github_token = credential.to_string();
    user.updated_at = Utc::now();
    store.update_user(&user)?;

    if promote && store.transition_role(&user.id, Role::PendingAdmin, Role::Admin)? {
        info!("'{}' confirmed as org admin at login", user.username);
        user.role = Role::Admin;
    }

    Ok(user)
}

fn new_user(profile: &ExternalProfile, credential: &str) -> NewUser {
    NewUser {
        id: Uuid::new_v4().to_string(),
        github_id: profile.id,
        username: profile.login.clone(),
        email: profile.email.clone(),
        fullname: profile.name.clone(),
        organization: profile.company.clone(),
        profile_image_url: profile.avatar_url.clone(),
        intro: profile.bio.clone(),
        github_token: credential.to_string(),
        created_at: Utc::now(),
    }
}

/// Fetches the org admin set once and promotes every pending admin found in it.
/// Returns the identities that were promoted.
pub async fn reconcile_pending_admins(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    credential: &str,
) -> Result<Vec<User>> {
    let admins = remote
        .list_org_members(credential, OrgRole::Admin)
        .await
        .map_err(Error::remote(RemoteOp::ListMembers))?;

    let mut promoted = Vec::new();
    for mut user in store.list_users_by_role(Role::PendingAdmin)? {
        if !admins.contains(&user.username) {
            continue;
        }
        if store.transition_role(&user.id, Role::PendingAdmin, Role::Admin)? {
            info!("'{}' confirmed as org admin", user.username);
            user.role = Role::Admin;
            promoted.push(user);
        }
    }

    Ok(promoted)
}

/// Reconciles pending admins, then returns every admin.
pub async fn list_admins(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    credential: &str,
) -> Result<Vec<User>> {
    reconcile_pending_admins(store, remote, credential).await?;
    store.list_users_by_role(Role::Admin)
}

/// Invites `username` to the org as admin and marks them pending.
/// Only plain users can be elevated.
pub async fn request_elevation(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    admin: &User,
    username: &str,
) -> Result<User> {
    let mut target = store
        .get_user_by_username(username)?
        .ok_or(Error::Missing(Entity::User))?;

    if !target.role.can_transition_to(Role::PendingAdmin) {
        return Err(Error::InvalidStateTransition {
            from: target.role,
            to: Role::PendingAdmin,
        });
    }

    remote
        .invite_member(&admin.github_token, target.github_id)
        .await
        .map_err(|e| {
            warn!("Invitation for '{}' failed: {e}", target.username);
            Error::remote(RemoteOp::Invite)(e)
        })?;

    if !store.transition_role(&target.id, Role::User, Role::PendingAdmin)? {
        let current = store
            .get_user(&target.id)?
            .ok_or(Error::Missing(Entity::User))?;
        return Err(Error::InvalidStateTransition {
            from: current.role,
            to: Role::PendingAdmin,
        });
    }

    info!("'{}' invited as admin by '{}'", target.username, admin.username);
    target.role = Role::PendingAdmin;
    Ok(target)
}

/// Removes `username` from the org and forces the local role to user.
/// Returns false when the username has no local identity.
pub async fn revoke_admin(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    admin: &User,
    username: &str,
) -> Result<bool> {
    remote
        .revoke_member(&admin.github_token, username)
        .await
        .map_err(Error::remote(RemoteOp::Revoke))?;

    let changed = store.set_role_by_username(username, Role::User)?;
    info!("'{}' revoked admin from '{}'", admin.username, username);
    Ok(changed)
}
