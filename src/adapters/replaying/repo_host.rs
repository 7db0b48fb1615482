//! Replaying adapter for the `RepoHost` port.

use std::sync::Mutex;

use serde_json::json;

use super::replay;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::repo_host::{FetchFuture, ListFuture};
use crate::ports::{ContentLocator, RepoHost};

/// Serves recorded listings and file contents from a cassette.
///
/// Calls are matched on their arguments, so concurrent fetches replay the
/// right content regardless of completion order.
pub struct ReplayingRepoHost {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingRepoHost {
    /// Creates a new replaying host from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl RepoHost for ReplayingRepoHost {
    fn list_dir<'a>(&'a self, owner: &'a str, repo: &'a str, path: &'a str) -> ListFuture<'a> {
        Box::pin(async move {
            let input = json!({"owner": owner, "repo": repo, "path": path});
            replay(&self.replayer, "repo", "list_dir", &input)
        })
    }

    fn fetch_raw<'a>(&'a self, locator: &'a ContentLocator) -> FetchFuture<'a> {
        Box::pin(async move {
            let input = json!({"locator": locator});
            replay(&self.replayer, "repo", "fetch_raw", &input)
        })
    }
}
