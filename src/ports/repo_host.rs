//! Repository host port for listing directories and fetching raw file contents.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed future returned by [`RepoHost::list_dir`].
pub type ListFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RepoEntry>, ListError>> + Send + 'a>>;

/// Boxed future returned by [`RepoHost::fetch_raw`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

/// Opaque locator used to download the raw bytes of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentLocator(pub String);

impl ContentLocator {
    /// Returns the locator as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory that can be listed.
    #[serde(alias = "dir")]
    Directory,
    /// Anything else the host reports (symlinks, submodules).
    #[serde(other)]
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// Entry name (last path component).
    pub name: String,
    /// Repo-relative path.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Download locator; present for files.
    pub content: Option<ContentLocator>,
}

/// Failure of a directory listing call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ListError {
    /// Credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The repository or path does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Network blip, rate limit, or server-side failure; worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),
    /// The host answered with something that is not a listing.
    #[error("malformed listing: {0}")]
    Malformed(String),
}

impl ListError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failure of a raw content download.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    /// Credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The file no longer exists at the locator.
    #[error("not found: {0}")]
    NotFound(String),
    /// Network blip or server-side failure; worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl FetchError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Lists repository directories and downloads raw file contents.
pub trait RepoHost: Send + Sync {
    /// Lists the entries of `path` (empty for the root) in `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns a [`ListError`] classifying the failure.
    fn list_dir<'a>(&'a self, owner: &'a str, repo: &'a str, path: &'a str) -> ListFuture<'a>;

    /// Downloads the raw text behind a content locator.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] classifying the failure.
    fn fetch_raw<'a>(&'a self, locator: &'a ContentLocator) -> FetchFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_kind_accepts_host_spellings() {
        let dir: EntryKind = serde_json::from_value(json!("dir")).unwrap();
        let file: EntryKind = serde_json::from_value(json!("file")).unwrap();
        let link: EntryKind = serde_json::from_value(json!("symlink")).unwrap();
        assert_eq!(dir, EntryKind::Directory);
        assert_eq!(file, EntryKind::File);
        assert_eq!(link, EntryKind::Other);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(ListError::Transient("reset".into()).is_transient());
        assert!(!ListError::Unauthorized("bad token".into()).is_transient());
        assert!(!ListError::NotFound("repo".into()).is_transient());
        assert!(FetchError::Transient("pipe".into()).is_transient());
        assert!(!FetchError::NotFound("gone".into()).is_transient());
    }
}
