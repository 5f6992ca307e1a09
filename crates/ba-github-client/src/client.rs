// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main GitHub REST API client implementation

use ba_domain_types::{Branch, Credential, Listing, Organization, RepoRef, Repository, Tag};
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::auth::request_headers;
use crate::error::{GitHubClientError, GitHubClientResult, GitHubErrorBody};
use crate::network_config::GitHubConfig;
use crate::pagination::{Paginator, has_next_page};

/// Account the credential authenticates as
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

/// REST client for the GitHub API.
///
/// The client holds no credential. Every call takes the caller's credential
/// explicitly so one client can serve several sessions.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: HttpClient,
    base_url: Url,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a new client
    pub fn new(config: GitHubConfig) -> GitHubClientResult<Self> {
        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        let http_client = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    /// Client against the public GitHub API with default settings
    pub fn with_defaults() -> GitHubClientResult<Self> {
        Self::new(GitHubConfig::default())
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Whether `refs/tags/{tag_name}` exists. A 404 means it does not; any
    /// other non-success status is an error.
    pub async fn tag_exists(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
    ) -> GitHubClientResult<bool> {
        let url = self.repo_endpoint(repo, &["git", "ref", "tags"], Some(tag_name))?;
        let response = self.get_with_retry(credential, url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(self.error_from_response(response).await),
        }
    }

    /// Create the lightweight tag `refs/tags/{tag_name}` pointing at `sha`
    pub async fn create_tag(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
        sha: &str,
    ) -> GitHubClientResult<()> {
        let url = self.repo_endpoint(repo, &["git", "refs"], None)?;
        let body = CreateRefRequest {
            git_ref: format!("refs/tags/{}", tag_name),
            sha,
        };

        tracing::debug!(repo = %repo, tag = %tag_name, sha = %sha, "Creating tag ref");
        let response = self.send(Method::POST, url, credential, Some(&body)).await?;
        self.expect_success(response).await
    }

    /// Delete `refs/heads/{branch}`
    pub async fn delete_branch_ref(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> GitHubClientResult<()> {
        let url = self.repo_endpoint(repo, &["git", "refs", "heads"], Some(branch))?;

        tracing::debug!(repo = %repo, branch = %branch, "Deleting branch ref");
        let response = self.send(Method::DELETE, url, credential, None::<&()>).await?;
        self.expect_success(response).await
    }

    /// Current head commit SHA of `branch`
    pub async fn branch_head_sha(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> GitHubClientResult<String> {
        let url = self.repo_endpoint(repo, &["branches"], Some(branch))?;
        let response = self.get_with_retry(credential, url).await?;
        let branch: Branch = self.handle_response(response).await?;
        Ok(branch.commit.sha)
    }

    /// Lazily page through the branches of `repo`
    pub fn branches<'a>(
        &'a self,
        credential: &'a Credential,
        repo: &RepoRef,
    ) -> GitHubClientResult<Paginator<'a, Branch>> {
        let url = self.repo_endpoint(repo, &["branches"], None)?;
        Ok(Paginator::new(self, credential, url))
    }

    /// Lazily page through the tags of `repo`
    pub fn tags<'a>(
        &'a self,
        credential: &'a Credential,
        repo: &RepoRef,
    ) -> GitHubClientResult<Paginator<'a, Tag>> {
        let url = self.repo_endpoint(repo, &["tags"], None)?;
        Ok(Paginator::new(self, credential, url))
    }

    /// All branches of `repo`, up to the page ceiling
    pub async fn list_branches(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> GitHubClientResult<Listing<Branch>> {
        self.branches(credential, repo)?.collect_all().await
    }

    /// All tags of `repo`, up to the page ceiling
    pub async fn list_tags(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> GitHubClientResult<Listing<Tag>> {
        self.tags(credential, repo)?.collect_all().await
    }

    /// Repositories the user owns or reaches through an organization,
    /// most recently updated first
    pub async fn list_repositories(
        &self,
        credential: &Credential,
    ) -> GitHubClientResult<Listing<Repository>> {
        let mut url = self.endpoint(&["user", "repos"])?;
        url.query_pairs_mut()
            .append_pair("affiliation", "owner,organization_member")
            .append_pair("sort", "updated");
        Paginator::new(self, credential, url).collect_all().await
    }

    /// Organizations the user belongs to
    pub async fn list_organizations(
        &self,
        credential: &Credential,
    ) -> GitHubClientResult<Listing<Organization>> {
        let url = self.endpoint(&["user", "orgs"])?;
        Paginator::new(self, credential, url).collect_all().await
    }

    /// Account behind `credential`
    pub async fn authenticated_user(
        &self,
        credential: &Credential,
    ) -> GitHubClientResult<AuthenticatedUser> {
        let url = self.endpoint(&["user"])?;
        let response = self.get_with_retry(credential, url).await?;
        self.handle_response(response).await
    }

    /// Fetch one listing page and report whether another one follows
    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        url: Url,
    ) -> GitHubClientResult<(Vec<T>, bool)> {
        let response = self.get_with_retry(credential, url).await?;
        let has_next = has_next_page(
            response.headers().get(LINK).and_then(|value| value.to_str().ok()),
        );
        let items = self.handle_response(response).await?;
        Ok((items, has_next))
    }

    // Private helper methods

    fn endpoint(&self, segments: &[&str]) -> GitHubClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `repos/{owner}/{name}/...` followed by an optional ref name. Ref names
    /// keep their `/` as path separators; every segment is percent-encoded.
    fn repo_endpoint(
        &self,
        repo: &RepoRef,
        segments: &[&str],
        ref_name: Option<&str>,
    ) -> GitHubClientResult<Url> {
        let mut url = self.endpoint(&["repos", repo.owner.as_str(), repo.name.as_str()])?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            path.extend(segments);
            if let Some(ref_name) = ref_name {
                path.extend(ref_name.split('/'));
            }
        }
        Ok(url)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        credential: &Credential,
        body: Option<&B>,
    ) -> GitHubClientResult<Response> {
        let mut request = self.http_client.request(method, url).headers(request_headers(credential)?);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        log_rate_limit(response.headers());
        Ok(response)
    }

    /// GET with bounded retries on 5xx, 429 and transport failures.
    /// Mutating requests are never retried.
    async fn get_with_retry(
        &self,
        credential: &Credential,
        url: Url,
    ) -> GitHubClientResult<Response> {
        let mut attempt = 0;
        loop {
            let result = self.send(Method::GET, url.clone(), credential, None::<&()>).await;
            let retryable = match &result {
                Ok(response) => {
                    let status = response.status();
                    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                }
                Err(e) => e.is_retryable(),
            };
            if !retryable || attempt >= self.config.max_retries {
                return result;
            }

            let delay = self.config.backoff_for_attempt(attempt);
            tracing::debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "Retrying GitHub request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> GitHubClientResult<T> {
        if response.status().is_success() {
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(GitHubClientError::from)
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    async fn expect_success(&self, response: Response) -> GitHubClientResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    async fn error_from_response(&self, response: Response) -> GitHubClientError {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return GitHubClientError::Http(e),
        };

        match serde_json::from_str::<GitHubErrorBody>(&text) {
            Ok(body) => GitHubClientError::Api {
                status,
                message: body.message,
                documentation_url: body.documentation_url,
            },
            Err(_) => GitHubClientError::UnexpectedResponse { status, body: text },
        }
    }
}

fn log_rate_limit(headers: &HeaderMap) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let Some(remaining) = header("x-ratelimit-remaining") else {
        return;
    };

    let reset = header("x-ratelimit-reset").unwrap_or_default();
    if remaining == "0" {
        tracing::warn!(reset = %reset, "GitHub rate limit exhausted");
    } else {
        tracing::trace!(remaining = %remaining, reset = %reset, "GitHub rate limit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_base_url: base.to_string(),
            ..GitHubConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_ref_names_keep_slashes_as_segments() {
        let client = client("https://api.github.com");
        let repo = RepoRef::new("octo", "widgets");

        let url = client
            .repo_endpoint(&repo, &["git", "ref", "tags"], Some("archive/feature-x"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/widgets/git/ref/tags/archive/feature-x"
        );

        let url = client
            .repo_endpoint(&repo, &["git", "refs", "heads"], Some("feature/a b#1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/widgets/git/refs/heads/feature/a%20b%231"
        );
    }

    #[test]
    fn test_enterprise_base_path_is_preserved() {
        let client = client("https://ghe.example.com/api/v3/");
        let url = client.endpoint(&["user", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user/repos");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = GitHubClient::new(GitHubConfig {
            api_base_url: "mailto:someone@example.com".to_string(),
            ..GitHubConfig::default()
        });
        assert!(matches!(result, Err(GitHubClientError::Url(_))));

        let result = GitHubClient::new(GitHubConfig {
            api_base_url: "not a url".to_string(),
            ..GitHubConfig::default()
        });
        assert!(matches!(result, Err(GitHubClientError::Url(_))));
    }

    #[test]
    fn test_create_ref_body_shape() {
        let body = CreateRefRequest {
            git_ref: "refs/tags/archive/feature-x".to_string(),
            sha: "abc123",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"ref": "refs/tags/archive/feature-x", "sha": "abc123"})
        );
    }

    #[tokio::test]
    async fn test_blank_credential_fails_before_any_request() {
        let client = client("http://127.0.0.1:9");
        let result = client
            .tag_exists(&Credential::new(""), &RepoRef::new("o", "n"), "archive/x")
            .await;
        assert!(matches!(result, Err(GitHubClientError::Auth(_))));
    }
}
