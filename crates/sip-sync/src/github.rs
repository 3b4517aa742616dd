//! # GitHub REST Client
//!
//! Lists proposal pull requests and reads their labels. Every listing is
//! paginated by following the `Link: <...>; rel="next"` response header
//! until GitHub stops sending one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client as HttpClient, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{GitHubToken, RepoRef};

const USER_AGENT: &str = concat!("sip-sync/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: &str = "100";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limit exceeded, reset in {reset_in:?}")]
    RateLimitExceeded { reset_in: Duration },

    #[error("Invalid GitHub URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid access token")]
    InvalidToken,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

/// A proposal pull request, as returned by the pulls listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// Where proposal pull requests and their labels come from.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Open and closed pull requests against the repository's branch that
    /// were never merged.
    async fn list_unmerged_pull_requests(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    /// Full label set of an issue or pull request.
    async fn issue_labels(&self, repo: &RepoRef, number: u64) -> Result<Vec<String>, GitHubError>;
}

/// GitHub API client for proposal pull requests
#[derive(Clone)]
pub struct GitHubClient {
    http_client: HttpClient,
    base_url: String,
}

impl GitHubClient {
    /// Create a client authenticated with `token` against `base_url`
    /// (`https://api.github.com` outside tests).
    pub fn new(token: &GitHubToken, base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| GitHubError::InvalidToken)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, GitHubError> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse_with_params(&raw, params).map_err(|e| GitHubError::InvalidUrl {
            url: raw,
            message: e.to_string(),
        })
    }

    /// GET every page starting at `url`, concatenating the JSON arrays.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut page = 0_u32;

        while let Some(current) = next.take() {
            page += 1;
            let response = self.http_client.get(current.as_str()).send().await?;
            let response = Self::check_status(response).await?;

            debug!(
                page,
                remaining = ?rate_limit_remaining(response.headers()),
                "Fetched page"
            );

            next = next_page_url(response.headers());
            let batch: Vec<T> = response.json().await?;
            items.extend(batch);
        }

        Ok(items)
    }

    /// Map non-success responses onto [`GitHubError`].
    async fn check_status(response: Response) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
            && rate_limit_remaining(response.headers()) == Some(0)
        {
            return Err(GitHubError::RateLimitExceeded {
                reset_in: rate_limit_reset_in(response.headers()).unwrap_or(Duration::from_secs(60)),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        Err(GitHubError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ProposalSource for GitHubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn list_unmerged_pull_requests(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let url = self.endpoint(
            &format!("/repos/{}/{}/pulls", repo.owner, repo.name),
            &[
                ("state", "all"),
                ("base", repo.branch.as_str()),
                ("per_page", PER_PAGE),
            ],
        )?;

        let all: Vec<PullRequest> = self.get_all_pages(url).await?;
        let total = all.len();
        let unmerged: Vec<PullRequest> = all.into_iter().filter(|pr| !pr.is_merged()).collect();

        info!(
            total,
            unmerged = unmerged.len(),
            "Listed proposal pull requests"
        );
        Ok(unmerged)
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn issue_labels(&self, repo: &RepoRef, number: u64) -> Result<Vec<String>, GitHubError> {
        let url = self.endpoint(
            &format!("/repos/{}/{}/issues/{number}/labels", repo.owner, repo.name),
            &[("per_page", PER_PAGE)],
        )?;

        let labels: Vec<GitHubLabel> = self.get_all_pages(url).await?;
        let labels: Vec<String> = labels.into_iter().map(|label| label.name).collect();

        debug!("Retrieved {} labels for #{}", labels.len(), number);
        Ok(labels)
    }
}

/// URL of the next page from a `Link` header, if there is one.
#[must_use]
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let url = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        parts
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| url.to_string())
    })
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn rate_limit_reset_in(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("x-ratelimit-reset")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .map(|reset_timestamp| {
            let now = Utc::now().timestamp();
            #[allow(clippy::cast_sign_loss)]
            let seconds_until_reset = (reset_timestamp - now).max(0) as u64;
            Duration::from_secs(seconds_until_reset)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_next_page_url() {
        let headers = link_headers(
            r#"<https://api.github.com/repositories/1/pulls?page=2>; rel="next", <https://api.github.com/repositories/1/pulls?page=5>; rel="last""#,
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/repositories/1/pulls?page=2")
        );
    }

    #[test]
    fn test_next_page_url_not_first_entry() {
        let headers = link_headers(
            r#"<https://x/pulls?page=1>; rel="prev", <https://x/pulls?page=3>; rel="next""#,
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://x/pulls?page=3")
        );
    }

    #[test]
    fn test_next_page_url_absent_on_last_page() {
        let headers = link_headers(
            r#"<https://x/pulls?page=1>; rel="first", <https://x/pulls?page=4>; rel="prev""#,
        );
        assert_eq!(next_page_url(&headers), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42"));
        assert_eq!(rate_limit_remaining(&headers), Some(42));

        let past = (Utc::now().timestamp() - 10).to_string();
        headers.insert("x-ratelimit-reset", HeaderValue::from_str(&past).unwrap());
        assert_eq!(rate_limit_reset_in(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_pull_request_merge_state() {
        let open: PullRequest = serde_json::from_str(
            r#"{"number": 46, "title": "SIP-46 - x", "state": "open", "merged_at": null, "labels": []}"#,
        )
        .unwrap();
        assert!(!open.is_merged());

        let merged: PullRequest = serde_json::from_str(
            r#"{"number": 47, "title": "y", "state": "closed", "merged_at": "2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(merged.is_merged());
    }

    #[test]
    fn test_client_rejects_unprintable_token() {
        let result = GitHubClient::new(&GitHubToken::new("bad\ntoken"), "https://api.github.com");
        assert!(matches!(result, Err(GitHubError::InvalidToken)));
    }
}
