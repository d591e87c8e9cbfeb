mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every method is a single atomic statement or transaction; callers never
/// hold a transaction open across remote calls.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations

    /// Inserts a user. The first user ever created claims the bootstrap
    /// marker and becomes admin; everyone after starts as a plain user.
    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_github_id(&self, github_id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn search_users(&self, keyword: &str) -> Result<Vec<User>>;
    fn list_users_by_role(&self, role: Role) -> Result<Vec<User>>;
    /// Writes every column except `role`, `github_id` and `created_at`.
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn has_bootstrapped(&self) -> Result<bool>;

    // Role operations

    /// Compare-and-set: moves `id` to `to` only if it currently holds `from`.
    fn transition_role(&self, id: &str, from: Role, to: Role) -> Result<bool>;
    fn set_role_by_username(&self, username: &str, role: Role) -> Result<bool>;

    // Exporter operations
    fn create_exporter(&self, exporter: &Exporter) -> Result<i64>;
    fn get_exporter(&self, id: i64) -> Result<Option<Exporter>>;
    fn update_exporter_stars(&self, id: i64, stars: i64) -> Result<()>;

    // Star operations
    fn has_star(&self, user_id: &str, exporter_id: i64) -> Result<bool>;
    fn add_star(&self, user_id: &str, exporter_id: i64) -> Result<()>;
    fn remove_star(&self, user_id: &str, exporter_id: i64) -> Result<bool>;

    // Bucket operations
    fn create_bucket(&self, bucket: &Bucket) -> Result<()>;
    fn get_bucket(&self, user_id: &str, exporter_id: i64) -> Result<Option<Bucket>>;
    fn delete_bucket(&self, user_id: &str, exporter_id: i64) -> Result<bool>;
    fn list_user_buckets(&self, user_id: &str) -> Result<Vec<BucketedExporter>>;
}
