use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{ExternalProfile, OrgRole, RemoteError, RemoteMembership, RemoteResult, RepoRef};
use crate::error::{Error, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("exporterhub/", env!("CARGO_PKG_VERSION"));
const MEMBERS_PER_PAGE: usize = 100;

/// [`RemoteMembership`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    organization: String,
}

#[derive(Debug, Deserialize)]
struct Member {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Fork {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RepoStats {
    stargazers_count: i64,
}

impl GithubClient {
    pub fn new(api_url: &str, organization: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, credential: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT);

        match credential {
            Some(token) => builder.header(AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    fn org_path(&self, rest: &str) -> String {
        format!("/orgs/{}{}", urlencoding::encode(&self.organization), rest)
    }
}

async fn send(builder: RequestBuilder, expected: StatusCode) -> RemoteResult<Response> {
    let resp = builder
        .send()
        .await
        .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

    if resp.status() == expected {
        Ok(resp)
    } else {
        Err(classify(resp.status()))
    }
}

fn classify(status: StatusCode) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::Conflict(format!("status {}", status.as_u16()))
        }
        other => RemoteError::Unavailable(format!("unexpected status {}", other.as_u16())),
    }
}

async fn body<T: DeserializeOwned>(resp: Response) -> RemoteResult<T> {
    resp.json()
        .await
        .map_err(|e| RemoteError::Unavailable(format!("invalid response body: {e}")))
}

#[async_trait]
impl RemoteMembership for GithubClient {
    async fn fetch_identity(&self, credential: &str) -> RemoteResult<ExternalProfile> {
        let resp = send(
            self.request(Method::GET, "/user", Some(credential)),
            StatusCode::OK,
        )
        .await?;
        body(resp).await
    }

    async fn list_org_members(
        &self,
        credential: &str,
        role: OrgRole,
    ) -> RemoteResult<HashSet<String>> {
        let mut members = HashSet::new();
        let mut page = 1;

        loop {
            let path = self.org_path(&format!(
                "/members?role={}&per_page={MEMBERS_PER_PAGE}&page={page}",
                role.as_str()
            ));
            let resp = send(
                self.request(Method::GET, &path, Some(credential)),
                StatusCode::OK,
            )
            .await?;
            let batch: Vec<Member> = body(resp).await?;
            let done = batch.len() < MEMBERS_PER_PAGE;
            members.extend(batch.into_iter().map(|m| m.login));

            if done {
                return Ok(members);
            }
            page += 1;
        }
    }

    async fn invite_member(&self, credential: &str, external_id: i64) -> RemoteResult<()> {
        let path = self.org_path("/invitations");
        let builder = self
            .request(Method::POST, &path, Some(credential))
            .json(&json!({ "invitee_id": external_id, "role": "admin" }));
        send(builder, StatusCode::CREATED).await?;
        Ok(())
    }

    async fn revoke_member(&self, credential: &str, username: &str) -> RemoteResult<()> {
        let path = self.org_path(&format!("/members/{}", urlencoding::encode(username)));
        send(
            self.request(Method::DELETE, &path, Some(credential)),
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    async fn star_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()> {
        let builder = self
            .request(Method::PUT, &format!("/user/starred/{item}"), Some(credential))
            .header(CONTENT_LENGTH, 0);
        send(builder, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    async fn unstar_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<()> {
        send(
            self.request(Method::DELETE, &format!("/user/starred/{item}"), Some(credential)),
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    async fn fork_item(&self, credential: &str, item: &RepoRef) -> RemoteResult<String> {
        let resp = send(
            self.request(Method::POST, &format!("/repos/{item}/forks"), Some(credential)),
            StatusCode::ACCEPTED,
        )
        .await?;
        let fork: Fork = body(resp).await?;
        Ok(fork.html_url)
    }

    async fn delete_fork(&self, credential: &str, forked_location: &str) -> RemoteResult<()> {
        let fork = RepoRef::from_url(forked_location).ok_or(RemoteError::NotFound)?;
        send(
            self.request(Method::DELETE, &format!("/repos/{fork}"), Some(credential)),
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    async fn get_star_count(&self, item: &RepoRef) -> RemoteResult<i64> {
        let resp = send(
            self.request(Method::GET, &format!("/repos/{item}"), None),
            StatusCode::OK,
        )
        .await?;
        let stats: RepoStats = body(resp).await?;
        Ok(stats.stargazers_count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::HeaderMap;
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;

    const ORG: &str = "acme";
    const CREDENTIAL: &str = "gho_test";

    /// Serves `router` on an ephemeral port and points a client at it.
    async fn client_for(router: Router) -> GithubClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        GithubClient::new(&base, ORG).unwrap()
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let expected = format!("token {CREDENTIAL}");
        headers
            .get("authorization")
            .is_some_and(|v| v.as_bytes() == expected.as_bytes())
    }

    fn node_exporter() -> RepoRef {
        RepoRef::from_url("https://github.com/prometheus/node_exporter").unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify(StatusCode::UNAUTHORIZED), RemoteError::Unauthorized);
        assert_eq!(classify(StatusCode::NOT_FOUND), RemoteError::NotFound);
        assert!(matches!(
            classify(StatusCode::UNPROCESSABLE_ENTITY),
            RemoteError::Conflict(_)
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn test_org_path_encodes_org() {
        let client = GithubClient::new("https://api.github.com/", "my org").unwrap();
        assert_eq!(client.org_path("/members"), "/orgs/my%20org/members");
        assert_eq!(client.api_url, "https://api.github.com");
    }

    #[tokio::test]
    async fn test_fetch_identity_sends_token_header() {
        let client = client_for(Router::new().route(
            "/user",
            get(|headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({ "id": 7, "login": "alice", "name": "Alice" })))
            }),
        ))
        .await;

        let profile = client.fetch_identity(CREDENTIAL).await.unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.login, "alice");
        assert_eq!(profile.name.as_deref(), Some("Alice"));

        assert_eq!(
            client.fetch_identity("gho_other").await,
            Err(RemoteError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_star_and_unstar_expect_no_content() {
        let client = client_for(Router::new().route(
            "/user/starred/{owner}/{repo}",
            put(|headers: HeaderMap| async move {
                if authorized(&headers) {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::UNAUTHORIZED
                }
            })
            .delete(|Path((owner, repo)): Path<(String, String)>| async move {
                if owner == "prometheus" && repo == "node_exporter" {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        ))
        .await;

        assert_eq!(client.star_item(CREDENTIAL, &node_exporter()).await, Ok(()));
        assert_eq!(client.unstar_item(CREDENTIAL, &node_exporter()).await, Ok(()));
        assert_eq!(
            client.star_item("gho_other", &node_exporter()).await,
            Err(RemoteError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_fork_returns_location_and_delete_expects_no_content() {
        let client = client_for(
            Router::new()
                .route(
                    "/repos/{owner}/{repo}/forks",
                    post(|Path((_, repo)): Path<(String, String)>| async move {
                        let html_url = format!("https://github.com/alice/{repo}");
                        (StatusCode::ACCEPTED, Json(json!({ "html_url": html_url })))
                    }),
                )
                .route(
                    "/repos/{owner}/{repo}",
                    delete(|Path((owner, _)): Path<(String, String)>| async move {
                        if owner == "alice" {
                            StatusCode::NO_CONTENT
                        } else {
                            StatusCode::FORBIDDEN
                        }
                    }),
                ),
        )
        .await;

        let location = client.fork_item(CREDENTIAL, &node_exporter()).await.unwrap();
        assert_eq!(location, "https://github.com/alice/node_exporter");

        assert_eq!(client.delete_fork(CREDENTIAL, &location).await, Ok(()));
        assert!(matches!(
            client
                .delete_fork(CREDENTIAL, "https://github.com/prometheus/node_exporter")
                .await,
            Err(RemoteError::Unavailable(_))
        ));
        assert_eq!(
            client.delete_fork(CREDENTIAL, "not a repository").await,
            Err(RemoteError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_invite_expects_created_and_revoke_expects_no_content() {
        let client = client_for(
            Router::new()
                .route(
                    "/orgs/{org}/invitations",
                    post(|Path(org): Path<String>, Json(body): Json<Value>| async move {
                        if org == ORG && body == json!({ "invitee_id": 9, "role": "admin" }) {
                            StatusCode::CREATED
                        } else {
                            StatusCode::UNPROCESSABLE_ENTITY
                        }
                    }),
                )
                .route(
                    "/orgs/{org}/members/{username}",
                    delete(|Path((_, username)): Path<(String, String)>| async move {
                        if username == "bob" {
                            StatusCode::NO_CONTENT
                        } else {
                            StatusCode::NOT_FOUND
                        }
                    }),
                ),
        )
        .await;

        assert_eq!(client.invite_member(CREDENTIAL, 9).await, Ok(()));
        assert!(matches!(
            client.invite_member(CREDENTIAL, 10).await,
            Err(RemoteError::Conflict(_))
        ));

        assert_eq!(client.revoke_member(CREDENTIAL, "bob").await, Ok(()));
        assert_eq!(
            client.revoke_member(CREDENTIAL, "carol").await,
            Err(RemoteError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_unexpected_success_status_is_a_failure() {
        let client = client_for(
            Router::new()
                .route(
                    "/user/starred/{owner}/{repo}",
                    put(|| async { StatusCode::OK }).delete(|| async { StatusCode::ACCEPTED }),
                )
                .route(
                    "/repos/{owner}/{repo}/forks",
                    post(|| async {
                        Json(json!({ "html_url": "https://github.com/alice/node_exporter" }))
                    }),
                )
                .route("/orgs/{org}/invitations", post(|| async { StatusCode::OK }))
                .route(
                    "/orgs/{org}/members/{username}",
                    delete(|| async { StatusCode::OK }),
                ),
        )
        .await;
        let item = node_exporter();

        for result in [
            client.star_item(CREDENTIAL, &item).await,
            client.unstar_item(CREDENTIAL, &item).await,
            client.fork_item(CREDENTIAL, &item).await.map(|_| ()),
            client.invite_member(CREDENTIAL, 9).await,
            client.revoke_member(CREDENTIAL, "bob").await,
        ] {
            assert!(matches!(result, Err(RemoteError::Unavailable(_))), "{result:?}");
        }
    }

    #[tokio::test]
    async fn test_list_org_members_follows_pages() {
        let client = client_for(Router::new().route(
            "/orgs/{org}/members",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("role").map(String::as_str) != Some("admin") {
                    return Err(StatusCode::BAD_REQUEST);
                }
                let page: usize = params
                    .get("page")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1);
                let count = if page == 1 { MEMBERS_PER_PAGE } else { 3 };
                let members: Vec<Value> = (0..count)
                    .map(|i| json!({ "login": format!("admin-{page}-{i}") }))
                    .collect();
                Ok(Json(members))
            }),
        ))
        .await;

        let admins = client
            .list_org_members(CREDENTIAL, OrgRole::Admin)
            .await
            .unwrap();
        assert_eq!(admins.len(), MEMBERS_PER_PAGE + 3);
        assert!(admins.contains("admin-1-0"));
        assert!(admins.contains("admin-2-2"));

        assert!(
            client
                .list_org_members(CREDENTIAL, OrgRole::Member)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_star_count_is_read_without_credential() {
        let client = client_for(Router::new().route(
            "/repos/{owner}/{repo}",
            get(|headers: HeaderMap| async move {
                if headers.contains_key("authorization") {
                    return Err(StatusCode::BAD_REQUEST);
                }
                Ok(Json(json!({ "stargazers_count": 42 })))
            }),
        ))
        .await;

        assert_eq!(client.get_star_count(&node_exporter()).await, Ok(42));
    }
}
