use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// A registered person, keyed by their GitHub account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub github_id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(skip)]
    pub github_token: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a user row that does not exist yet. The role is decided by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub github_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub organization: Option<String>,
    pub profile_image_url: Option<String>,
    pub intro: Option<String>,
    pub github_token: String,
    pub created_at: DateTime<Utc>,
}

/// A catalog item. Managed elsewhere; this service only reads it and refreshes `stars`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exporter {
    pub id: i64,
    pub name: String,
    pub repository_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stars: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_release: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub user_id: String,
    pub exporter_id: i64,
    pub forked_repository_url: String,
    pub created_at: DateTime<Utc>,
}

/// An exporter in a user's bucket, joined with the fork location and star state.
#[derive(Debug, Clone)]
pub struct BucketedExporter {
    pub exporter: Exporter,
    pub forked_repository_url: String,
    pub is_star: bool,
}
