//! Star and bucket (fork) relations. The remote side-effect always runs
//! first; the local relation changes only after it succeeds.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{Entity, Error, Result};
use crate::github::{RemoteMembership, RemoteOp, RepoRef};
use crate::store::Store;
use crate::types::{Bucket, Exporter, User};

fn load_exporter(store: &dyn Store, exporter_id: i64) -> Result<(Exporter, RepoRef)> {
    let exporter = store
        .get_exporter(exporter_id)?
        .ok_or(Error::Missing(Entity::Exporter))?;
    let item = RepoRef::from_url(&exporter.repository_url)
        .ok_or_else(|| Error::InvalidRepositoryUrl(exporter.repository_url.clone()))?;
    Ok((exporter, item))
}

/// Flips the caller's star on an exporter. Returns the new state (true = starred).
///
/// The exporter's star count is refreshed afterwards. That read is not atomic
/// with the toggle; a failed refresh is logged and leaves the old count.
pub async fn toggle_star(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    user: &User,
    exporter_id: i64,
) -> Result<bool> {
    let (exporter, item) = load_exporter(store, exporter_id)?;
    let starred = store.has_star(&user.id, exporter.id)?;

    if starred {
        remote
            .unstar_item(&user.github_token, &item)
            .await
            .map_err(Error::remote(RemoteOp::Unstar))?;
        store.remove_star(&user.id, exporter.id)?;
    } else {
        remote
            .star_item(&user.github_token, &item)
            .await
            .map_err(Error::remote(RemoteOp::Star))?;
        store.add_star(&user.id, exporter.id)?;
    }

    match remote.get_star_count(&item).await {
        Ok(count) => store.update_exporter_stars(exporter.id, count)?,
        Err(e) => warn!("Star count refresh for {item} failed: {e}"),
    }

    Ok(!starred)
}

#[derive(Debug, Clone)]
pub enum BucketOutcome {
    Created(Bucket),
    AlreadyForked(Bucket),
}

impl BucketOutcome {
    #[must_use]
    pub fn bucket(&self) -> &Bucket {
        match self {
            BucketOutcome::Created(b) | BucketOutcome::AlreadyForked(b) => b,
        }
    }
}

/// Forks the exporter's repository for the caller and records it.
/// A second call for the same exporter is a successful no-op.
pub async fn create_bucket(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    user: &User,
    exporter_id: i64,
) -> Result<BucketOutcome> {
    let (exporter, item) = load_exporter(store, exporter_id)?;

    if let Some(existing) = store.get_bucket(&user.id, exporter.id)? {
        return Ok(BucketOutcome::AlreadyForked(existing));
    }

    let location = remote
        .fork_item(&user.github_token, &item)
        .await
        .map_err(Error::remote(RemoteOp::Fork))?;

    let bucket = Bucket {
        user_id: user.id.clone(),
        exporter_id: exporter.id,
        forked_repository_url: location,
        created_at: Utc::now(),
    };

    match store.create_bucket(&bucket) {
        Ok(()) => {
            info!("'{}' forked {item} to {}", user.username, bucket.forked_repository_url);
            Ok(BucketOutcome::Created(bucket))
        }
        // Lost a race with a concurrent create for the same pair.
        Err(Error::AlreadyExists) => store
            .get_bucket(&user.id, exporter.id)?
            .map(BucketOutcome::AlreadyForked)
            .ok_or(Error::Missing(Entity::Bucket)),
        Err(e) => Err(e),
    }
}

/// Removes an exporter from the caller's bucket. With `delete_remote` the
/// fork is deleted first; without it the fork stays on the provider.
pub async fn delete_bucket(
    store: &dyn Store,
    remote: &dyn RemoteMembership,
    user: &User,
    exporter_id: i64,
    delete_remote: bool,
) -> Result<Bucket> {
    let exporter = store
        .get_exporter(exporter_id)?
        .ok_or(Error::Missing(Entity::Exporter))?;
    let bucket = store
        .get_bucket(&user.id, exporter.id)?
        .ok_or(Error::Missing(Entity::Bucket))?;

    if delete_remote {
        remote
            .delete_fork(&user.github_token, &bucket.forked_repository_url)
            .await
            .map_err(Error::remote(RemoteOp::DeleteFork))?;
    }

    store.delete_bucket(&user.id, exporter.id)?;
    Ok(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::FakeGithub;
    use crate::roles;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: SqliteStore,
        remote: FakeGithub,
        user: User,
        exporter_id: i64,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let remote = FakeGithub::new().with_account("tok-alice", 1, "alice");
        let user = roles::login(&store, &remote, "tok-alice").await.unwrap();
        let exporter_id = store
            .create_exporter(&Exporter {
                id: 0,
                name: "node_exporter".into(),
                repository_url: "https://github.com/prometheus/node_exporter".into(),
                logo_url: None,
                category: None,
                official: None,
                description: None,
                stars: 0,
                recent_release: None,
            })
            .unwrap();

        Fixture {
            _temp: temp,
            store,
            remote,
            user,
            exporter_id,
        }
    }

    #[tokio::test]
    async fn test_star_toggle_pairs_return_to_start() {
        let f = fixture().await;

        let on = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        assert!(on);
        assert!(f.store.has_star(&f.user.id, f.exporter_id).unwrap());
        assert_eq!(f.store.get_exporter(f.exporter_id).unwrap().unwrap().stars, 1);

        let off = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        assert!(!off);
        assert!(!f.store.has_star(&f.user.id, f.exporter_id).unwrap());
        assert_eq!(f.store.get_exporter(f.exporter_id).unwrap().unwrap().stars, 0);
    }

    #[tokio::test]
    async fn test_failed_star_leaves_relation_unchanged() {
        let f = fixture().await;
        f.remote.fail(RemoteOp::Star);

        let result = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await;

        assert!(matches!(result, Err(Error::Remote { op: RemoteOp::Star, .. })));
        assert!(!f.store.has_star(&f.user.id, f.exporter_id).unwrap());
        assert_eq!(f.remote.calls(RemoteOp::StarCount), 0);
    }

    #[tokio::test]
    async fn test_failed_unstar_leaves_relation_unchanged() {
        let f = fixture().await;
        toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        f.remote.fail(RemoteOp::Unstar);

        let result = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await;

        assert!(matches!(result, Err(Error::Remote { op: RemoteOp::Unstar, .. })));
        assert!(f.store.has_star(&f.user.id, f.exporter_id).unwrap());
    }

    #[tokio::test]
    async fn test_star_count_failure_does_not_undo_toggle() {
        let f = fixture().await;
        f.remote.fail(RemoteOp::StarCount);

        let on = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();

        assert!(on);
        assert!(f.store.has_star(&f.user.id, f.exporter_id).unwrap());
        assert_eq!(f.store.get_exporter(f.exporter_id).unwrap().unwrap().stars, 0);
    }

    #[tokio::test]
    async fn test_star_unknown_exporter() {
        let f = fixture().await;
        let result = toggle_star(&f.store, &f.remote, &f.user, f.exporter_id + 100).await;
        assert!(matches!(result, Err(Error::Missing(Entity::Exporter))));
    }

    #[tokio::test]
    async fn test_bucket_create_is_idempotent() {
        let f = fixture().await;

        let first = create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        assert!(matches!(first, BucketOutcome::Created(_)));
        assert_eq!(
            first.bucket().forked_repository_url,
            "https://github.com/alice/node_exporter"
        );

        let second = create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        assert!(matches!(second, BucketOutcome::AlreadyForked(_)));
        assert_eq!(f.remote.calls(RemoteOp::Fork), 1);
        assert_eq!(f.store.list_user_buckets(&f.user.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fork_creates_nothing() {
        let f = fixture().await;
        f.remote.fail(RemoteOp::Fork);

        let result = create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await;

        assert!(matches!(result, Err(Error::Remote { op: RemoteOp::Fork, .. })));
        assert!(f.store.get_bucket(&f.user.id, f.exporter_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_bucket_keeps_remote_fork_by_default() {
        let f = fixture().await;
        let created = create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        let location = created.bucket().forked_repository_url.clone();

        delete_bucket(&f.store, &f.remote, &f.user, f.exporter_id, false)
            .await
            .unwrap();

        assert!(f.store.get_bucket(&f.user.id, f.exporter_id).unwrap().is_none());
        assert!(f.remote.has_fork(&location));
        assert_eq!(f.remote.calls(RemoteOp::DeleteFork), 0);
    }

    #[tokio::test]
    async fn test_delete_bucket_with_remote_delete() {
        let f = fixture().await;
        let created = create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        let location = created.bucket().forked_repository_url.clone();

        delete_bucket(&f.store, &f.remote, &f.user, f.exporter_id, true)
            .await
            .unwrap();

        assert!(f.store.get_bucket(&f.user.id, f.exporter_id).unwrap().is_none());
        assert!(!f.remote.has_fork(&location));
    }

    #[tokio::test]
    async fn test_failed_remote_delete_keeps_relation() {
        let f = fixture().await;
        create_bucket(&f.store, &f.remote, &f.user, f.exporter_id).await.unwrap();
        f.remote.fail(RemoteOp::DeleteFork);

        let result = delete_bucket(&f.store, &f.remote, &f.user, f.exporter_id, true).await;

        assert!(matches!(result, Err(Error::Remote { op: RemoteOp::DeleteFork, .. })));
        assert!(f.store.get_bucket(&f.user.id, f.exporter_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_bucket() {
        let f = fixture().await;

        let result = delete_bucket(&f.store, &f.remote, &f.user, f.exporter_id, false).await;
        assert!(matches!(result, Err(Error::Missing(Entity::Bucket))));

        let result = delete_bucket(&f.store, &f.remote, &f.user, f.exporter_id + 1, false).await;
        assert!(matches!(result, Err(Error::Missing(Entity::Exporter))));
    }
}
