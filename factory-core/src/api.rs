//! Remote repository API — the [`RepoApi`] trait and its GitHub client.
//!
//! The trait is the seam the scanner and sync layers operate through; tests
//! substitute in-memory doubles. The GitHub implementation talks to the
//! contents API:
//!
//! - `GET    /repos/{owner}/{repo}/contents/{path}?ref=…`
//! - `DELETE /repos/{owner}/{repo}/contents/{path}`
//! - `PUT    /repos/{owner}/{repo}/contents/{path}`
//!
//! A 404 on the GET is a valid probe result, surfaced as `Ok(None)`; every
//! other non-success status is an [`ApiError::Status`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const GITHUB_API: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Entry type reported by the contents API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One entry of a contents response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    pub sha: String,
    /// Base64 content; present on single-file responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A contents response is either one file object or a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentResponse {
    Listing(Vec<FileEntry>),
    File(FileEntry),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The remote repository capability consumed by scanning and sync.
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Fetch the content at `path`. `Ok(None)` means the path does not exist.
    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        ref_name: Option<&str>,
    ) -> Result<Option<ContentResponse>, ApiError>;

    /// Delete the file at `path` on `branch`, identified by `sha`.
    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        sha: &str,
        message: &str,
    ) -> Result<(), ApiError>;

    /// Create or update the file at `path` on `branch` with base64 `content`.
    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// GitHub client
// ---------------------------------------------------------------------------

/// GitHub contents-API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    /// Build a client authenticated with a bearer `token`.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(token, GITHUB_API)
    }

    /// Build a client against a non-default API root (test servers).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("pipeline-factory"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}/contents/{}", self.base_url, owner, repo, path)
    }
}

async fn check_status(resp: reqwest::Response, path: &str) -> Result<reqwest::Response, ApiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        path: path.to_owned(),
        body,
    })
}

#[async_trait]
impl RepoApi for GithubClient {
    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        ref_name: Option<&str>,
    ) -> Result<Option<ContentResponse>, ApiError> {
        let mut req = self.http.get(self.contents_url(owner, repo, path));
        if let Some(r) = ref_name {
            req = req.query(&[("ref", r)]);
        }
        let resp = req.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, path).await?;
        Ok(Some(resp.json().await?))
    }

    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        sha: &str,
        message: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "message": message,
            "sha": sha,
            "branch": branch,
        });
        let resp = self
            .http
            .delete(self.contents_url(owner, repo, path))
            .json(&body)
            .send()
            .await?;
        check_status(resp, path).await?;
        Ok(())
    }

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "message": message,
            "content": content,
            "branch": branch,
        });
        let resp = self
            .http
            .put(self.contents_url(owner, repo, path))
            .json(&body)
            .send()
            .await?;
        check_status(resp, path).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
