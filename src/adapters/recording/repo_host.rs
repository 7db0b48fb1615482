//! Recording adapter for the `RepoHost` port.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::repo_host::{FetchFuture, ListFuture};
use crate::ports::{ContentLocator, RepoHost};

/// Records repository-host interactions while delegating to an inner host.
pub struct RecordingRepoHost {
    inner: Box<dyn RepoHost>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingRepoHost {
    /// Wraps `inner`, appending every call to `recorder`.
    pub fn new(inner: Box<dyn RepoHost>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl RepoHost for RecordingRepoHost {
    fn list_dir<'a>(&'a self, owner: &'a str, repo: &'a str, path: &'a str) -> ListFuture<'a> {
        Box::pin(async move {
            let result = self.inner.list_dir(owner, repo, path).await;
            let input = json!({"owner": owner, "repo": repo, "path": path});
            record_result(&self.recorder, "repo", "list_dir", &input, &result);
            result
        })
    }

    fn fetch_raw<'a>(&'a self, locator: &'a ContentLocator) -> FetchFuture<'a> {
        Box::pin(async move {
            let result = self.inner.fetch_raw(locator).await;
            let input = json!({"locator": locator});
            record_result(&self.recorder, "repo", "fetch_raw", &input, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::ReplayingRepoHost;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;
    use crate::ports::{EntryKind, FetchError, RepoEntry};
    use chrono::Utc;

    fn inner() -> ReplayingRepoHost {
        let cassette = Cassette {
            name: "inner".into(),
            recorded_at: Utc::now(),
            tool_version: "test".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "repo".into(),
                    method: "list_dir".into(),
                    input: serde_json::Value::Null,
                    output: json!({"ok": [
                        {"name": "a.rb", "path": "a.rb", "kind": "file", "content": "https://raw/a.rb"}
                    ]}),
                },
                Interaction {
                    seq: 1,
                    port: "repo".into(),
                    method: "fetch_raw".into(),
                    input: serde_json::Value::Null,
                    output: json!({"err": {"NotFound": "gone"}}),
                },
            ],
        };
        ReplayingRepoHost::new(CassetteReplayer::new(&cassette))
    }

    #[tokio::test]
    async fn records_calls_and_replays_them_back() {
        let dir = std::env::temp_dir().join("portguide_recording_repo_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("repo.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "record")));

        let host = RecordingRepoHost::new(Box::new(inner()), Arc::clone(&recorder));
        let listed = host.list_dir("acme", "shop", "").await.unwrap();
        assert_eq!(listed[0].kind, EntryKind::File);
        let locator = listed[0].content.clone().unwrap();
        assert_eq!(host.fetch_raw(&locator).await, Err(FetchError::NotFound("gone".into())));
        drop(host);

        Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();
        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(
            cassette.interactions[0].input,
            json!({"owner": "acme", "repo": "shop", "path": ""})
        );
        assert_eq!(cassette.interactions[1].input, json!({"locator": "https://raw/a.rb"}));

        let replay = ReplayingRepoHost::new(CassetteReplayer::new(&cassette));
        let entries: Vec<RepoEntry> = replay.list_dir("acme", "shop", "").await.unwrap();
        assert_eq!(entries, listed);
        assert_eq!(replay.fetch_raw(&locator).await, Err(FetchError::NotFound("gone".into())));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
