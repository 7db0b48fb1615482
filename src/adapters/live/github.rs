//! Live adapter for the `RepoHost` port using the GitHub REST contents API.

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::ports::repo_host::{FetchFuture, ListFuture};
use crate::ports::{ContentLocator, EntryKind, FetchError, ListError, RepoEntry, RepoHost};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_NAME: &str = concat!("portguide/", env!("CARGO_PKG_VERSION"));

/// Live repository host that calls the GitHub contents API.
pub struct GithubRepoHost {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubRepoHost {
    /// Creates a client for the API at `config.api_base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GithubConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("Failed to build GitHub HTTP client: {e}"))?;
        Ok(Self { client, api_base: config.api_base.clone(), token: config.token.clone() })
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url, ListError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| ListError::Malformed(format!("invalid API base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|()| ListError::Malformed(format!("API base {} cannot hold a path", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", owner, repo, "contents"])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(USER_AGENT, CLIENT_NAME);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// One item in a contents API response.
#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// The contents API returns an array for directories and an object for files.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsBody {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

impl From<ContentItem> for RepoEntry {
    fn from(item: ContentItem) -> Self {
        let kind = match item.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            _ => EntryKind::Other,
        };
        Self {
            name: item.name,
            path: item.path,
            kind,
            content: item.download_url.map(ContentLocator),
        }
    }
}

/// Error response body from the GitHub API.
#[derive(Deserialize)]
struct GithubError {
    message: String,
}

fn error_message(body: String) -> String {
    serde_json::from_str::<GithubError>(&body).map(|e| e.message).unwrap_or(body)
}

fn classify_list_status(status: StatusCode, rate_limited: bool, body: String) -> ListError {
    let msg = format!("GitHub API error ({}): {}", status.as_u16(), error_message(body));
    match status {
        StatusCode::TOO_MANY_REQUESTS => ListError::Transient(msg),
        StatusCode::FORBIDDEN if rate_limited => ListError::Transient(msg),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ListError::Unauthorized(msg),
        StatusCode::NOT_FOUND => ListError::NotFound(msg),
        s if s.is_server_error() => ListError::Transient(msg),
        _ => ListError::Malformed(msg),
    }
}

fn classify_fetch_status(status: StatusCode, body: String) -> FetchError {
    let msg = format!("raw content error ({}): {}", status.as_u16(), error_message(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized(msg),
        StatusCode::NOT_FOUND => FetchError::NotFound(msg),
        _ => FetchError::Transient(msg),
    }
}

impl RepoHost for GithubRepoHost {
    fn list_dir<'a>(&'a self, owner: &'a str, repo: &'a str, path: &'a str) -> ListFuture<'a> {
        Box::pin(async move {
            let url = self.contents_url(owner, repo, path)?;
            let response = self
                .authorized(self.client.get(url))
                .header(ACCEPT, GITHUB_ACCEPT)
                .send()
                .await
                .map_err(|e| ListError::Transient(format!("GitHub API request failed: {e}")))?;

            let status = response.status();
            let rate_limited = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0");
            let body = response
                .text()
                .await
                .map_err(|e| ListError::Transient(format!("Failed to read GitHub response: {e}")))?;

            if !status.is_success() {
                return Err(classify_list_status(status, rate_limited, body));
            }

            let parsed: ContentsBody = serde_json::from_str(&body)
                .map_err(|e| ListError::Malformed(format!("Failed to parse GitHub listing: {e}")))?;
            Ok(match parsed {
                ContentsBody::Listing(items) => items.into_iter().map(RepoEntry::from).collect(),
                ContentsBody::Single(item) => vec![RepoEntry::from(item)],
            })
        })
    }

    fn fetch_raw<'a>(&'a self, locator: &'a ContentLocator) -> FetchFuture<'a> {
        Box::pin(async move {
            let response = self
                .authorized(self.client.get(locator.as_str()))
                .send()
                .await
                .map_err(|e| FetchError::Transient(format!("content download failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_fetch_status(status, body));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transient(format!("Failed to read content: {e}")))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    }
}
