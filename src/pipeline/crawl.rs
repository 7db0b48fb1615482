//! Depth-first repository crawl over an explicit work stack.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cancel::Cancellation;
use super::retry::{retry, RetryError, RetryPolicy};
use crate::ports::{ContentLocator, EntryKind, ListError, RepoEntry, RepoHost, Sleeper};

/// A file discovered by the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Repo-relative path; unique within one crawl.
    pub path: String,
    /// File name.
    pub name: String,
    /// Where to download the raw content from.
    pub content_ref: ContentLocator,
}

/// A directory whose listing kept failing and was treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDirectory {
    /// Repo-relative path.
    pub path: String,
    /// Last listing error.
    pub reason: String,
}

/// Result of a crawl: the ordered file list plus partial-result indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Files in depth-first discovery order, each path at most once.
    pub files: Vec<FileDescriptor>,
    /// Subtrees given up on after retries.
    pub skipped_directories: Vec<SkippedDirectory>,
    /// Repeated file or directory entries that were dropped.
    pub duplicates: usize,
}

impl CrawlOutcome {
    /// Whether any subtree was skipped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped_directories.is_empty()
    }
}

/// Crawl failures that abort the whole crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    /// Credentials were rejected.
    #[error("repository host rejected credentials: {0}")]
    Unauthorized(String),
    /// Repository or path does not exist.
    #[error("repository or path not found: {0}")]
    NotFound(String),
    /// The host returned something that is not a listing.
    #[error("unexpected listing response: {0}")]
    Malformed(String),
    /// The root listing failed on every attempt.
    #[error("repository host unreachable after {attempts} attempts: {last}")]
    Unreachable {
        /// Attempts made.
        attempts: u32,
        /// Last transient error.
        last: String,
    },
    /// Cancellation was requested.
    #[error("crawl cancelled")]
    Cancelled,
}

impl From<ListError> for CrawlError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Unauthorized(msg) => Self::Unauthorized(msg),
            ListError::NotFound(msg) => Self::NotFound(msg),
            ListError::Malformed(msg) => Self::Malformed(msg),
            ListError::Transient(last) => Self::Unreachable { attempts: 1, last },
        }
    }
}

/// Enumerates every file under a repository root.
pub struct RepoCrawler<'a> {
    host: &'a dyn RepoHost,
    sleeper: &'a dyn Sleeper,
    delay: Duration,
    retry: RetryPolicy,
    cancel: Cancellation,
}

impl<'a> RepoCrawler<'a> {
    /// Creates a crawler pausing `delay` before each subdirectory listing.
    #[must_use]
    pub fn new(
        host: &'a dyn RepoHost,
        sleeper: &'a dyn Sleeper,
        delay: Duration,
        retry: RetryPolicy,
        cancel: Cancellation,
    ) -> Self {
        Self { host, sleeper, delay, retry, cancel }
    }

    /// Crawls `owner/repo` starting at `root` (empty for the repository root).
    ///
    /// Files are returned in depth-first order: entries in listing order,
    /// each subdirectory expanded where it appears. A subdirectory whose
    /// listing stays transiently broken is skipped and reported in
    /// [`CrawlOutcome::skipped_directories`].
    ///
    /// # Errors
    ///
    /// Fails without retrying on authorization, not-found and malformed
    /// responses, and with [`CrawlError::Unreachable`] when the root itself
    /// cannot be listed.
    pub async fn crawl(
        &self,
        owner: &str,
        repo: &str,
        root: &str,
    ) -> Result<CrawlOutcome, CrawlError> {
        let root = root.trim_matches('/');
        let mut outcome = CrawlOutcome::default();
        let mut seen_files: HashSet<String> = HashSet::new();
        let mut seen_dirs: HashSet<String> = HashSet::from([root.to_string()]);

        let root_entries = match self.list(owner, repo, root).await {
            Ok(entries) => entries,
            Err(RetryError::Exhausted { attempts, last }) => {
                return Err(CrawlError::Unreachable { attempts, last: last.to_string() });
            }
            Err(RetryError::Fatal(err)) => return Err(err.into()),
            Err(RetryError::Cancelled) => return Err(CrawlError::Cancelled),
        };

        let mut stack: Vec<VecDeque<RepoEntry>> = vec![root_entries.into()];
        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.pop_front() else {
                stack.pop();
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    let Some(content_ref) = entry.content else {
                        debug!(path = %entry.path, "file without download locator, skipping");
                        continue;
                    };
                    if seen_files.insert(entry.path.clone()) {
                        outcome.files.push(FileDescriptor {
                            path: entry.path,
                            name: entry.name,
                            content_ref,
                        });
                    } else {
                        outcome.duplicates += 1;
                        debug!(path = %entry.path, "duplicate file entry dropped");
                    }
                }
                EntryKind::Directory => {
                    if !seen_dirs.insert(entry.path.clone()) {
                        outcome.duplicates += 1;
                        debug!(path = %entry.path, "directory already visited");
                        continue;
                    }
                    if self.cancel.sleep(self.sleeper, self.delay).await.is_err() {
                        return Err(CrawlError::Cancelled);
                    }
                    match self.list(owner, repo, &entry.path).await {
                        Ok(entries) => stack.push(entries.into()),
                        Err(RetryError::Exhausted { attempts, last }) => {
                            warn!(
                                path = %entry.path,
                                attempts,
                                error = %last,
                                "directory listing kept failing, treating subtree as empty"
                            );
                            outcome
                                .skipped_directories
                                .push(SkippedDirectory { path: entry.path, reason: last.to_string() });
                        }
                        Err(RetryError::Fatal(err)) => return Err(err.into()),
                        Err(RetryError::Cancelled) => return Err(CrawlError::Cancelled),
                    }
                }
                EntryKind::Other => {
                    debug!(path = %entry.path, "skipping entry that is neither file nor directory");
                }
            }
        }

        info!(
            owner,
            repo,
            files = outcome.files.len(),
            skipped = outcome.skipped_directories.len(),
            duplicates = outcome.duplicates,
            "crawl finished"
        );
        Ok(outcome)
    }

    async fn list(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<RepoEntry>, RetryError<ListError>> {
        debug!(path, "listing directory");
        retry(self.retry, self.sleeper, &self.cancel, "list_dir", ListError::is_transient, || {
            self.host.list_dir(owner, repo, path)
        })
        .await
    }
}
