use serde::{Deserialize, Serialize};

use crate::types::{BucketedExporter, Role, User};

/// Release date reported for exporters that have never published one.
const NO_RELEASE: &str = "1970-01-01";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(rename = "type")]
    pub usertype: Role,
}

#[derive(Debug, Deserialize)]
pub struct ExporterRequest {
    pub exporter_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StarResponse {
    #[serde(rename = "isStar")]
    pub is_star: bool,
}

#[derive(Debug, Serialize)]
pub struct BucketResponse {
    pub exporter_id: i64,
    pub forked_repository_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBucketParams {
    #[serde(rename = "exporter-id")]
    pub exporter_id: i64,
    #[serde(default)]
    pub deleteall: Option<String>,
}

impl DeleteBucketParams {
    /// `deleteall` counts as set unless absent, empty, `0` or `false`.
    #[must_use]
    pub fn delete_remote(&self) -> bool {
        match self.deleteall.as_deref() {
            None | Some("" | "0") => false,
            Some(value) => !value.eq_ignore_ascii_case("false"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketItem {
    pub exporter_id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    pub category: Option<String>,
    pub official: Option<String>,
    pub stars: i64,
    pub is_star: bool,
    pub repository_url: String,
    pub forked_repository_url: String,
    pub description: Option<String>,
    pub recent_release: String,
}

impl From<BucketedExporter> for BucketItem {
    fn from(item: BucketedExporter) -> Self {
        let exporter = item.exporter;
        Self {
            exporter_id: exporter.id,
            name: exporter.name,
            logo_url: exporter.logo_url,
            category: exporter.category,
            official: exporter.official,
            stars: exporter.stars,
            is_star: item.is_star,
            repository_url: exporter.repository_url,
            forked_repository_url: item.forked_repository_url,
            description: exporter.description,
            recent_release: exporter
                .recent_release
                .unwrap_or_else(|| NO_RELEASE.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub organization: Option<String>,
    pub profile_image_url: Option<String>,
    pub intro: Option<String>,
    #[serde(rename = "type")]
    pub usertype: Role,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            full_name: user.fullname,
            organization: user.organization,
            profile_image_url: user.profile_image_url,
            intro: user.intro,
            usertype: user.role,
        }
    }
}

/// Absent fields keep their stored value; an empty string clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminStatusResponse {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub usertype: String,
    pub profile_image_url: Option<String>,
}

impl UserSummary {
    /// Entry in the admin listing, which labels every row `Admin`.
    #[must_use]
    pub fn admin(user: User) -> Self {
        Self {
            username: user.username,
            usertype: "Admin".to_string(),
            profile_image_url: user.profile_image_url,
        }
    }
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            usertype: user.role.to_string(),
            profile_image_url: user.profile_image_url,
        }
    }
}
