//! Service context bundling all port trait objects.

use std::path::Path;

use crate::adapters::instant::InstantSleeper;
use crate::adapters::live::{GithubRepoHost, OpenAiClient, TokioSleeper};
use crate::adapters::recording::{RecordingLlmClient, RecordingRepoHost};
use crate::adapters::replaying::{ReplayingLlmClient, ReplayingRepoHost};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::config::Config;
use crate::ports::repo_host::{FetchFuture, ListFuture};
use crate::ports::{
    CompletionRequest, ContentLocator, DocumentRenderer, LlmClient, LlmFuture, RepoHost, Sleeper,
};
use crate::render::MarkdownRenderer;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Repository host for listings and raw file contents.
    pub repo: Box<dyn RepoHost>,
    /// LLM client for guide completions.
    pub llm: Box<dyn LlmClient>,
    /// Sleeper for politeness delays and retry backoff.
    pub sleeper: Box<dyn Sleeper>,
    /// Renderer for the final document.
    pub renderer: Box<dyn DocumentRenderer>,
}

impl ServiceContext {
    /// Bundles the given adapters.
    #[must_use]
    pub fn new(
        repo: Box<dyn RepoHost>,
        llm: Box<dyn LlmClient>,
        sleeper: Box<dyn Sleeper>,
        renderer: Box<dyn DocumentRenderer>,
    ) -> Self {
        Self { repo, llm, sleeper, renderer }
    }

    /// Creates a live context talking to GitHub and the OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn live(config: &Config) -> Result<Self, String> {
        Ok(Self::new(
            Box::new(GithubRepoHost::new(&config.github)?),
            Box::new(OpenAiClient::new(&config.llm)?),
            Box::new(TokioSleeper),
            Box::new(MarkdownRenderer),
        ))
    }

    /// Creates a live context whose repository and LLM traffic is captured
    /// into a new timestamped cassette directory under `base`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette directory or an HTTP client cannot be created.
    pub fn recording_at(config: &Config, base: &Path) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base)?;
        let ctx = Self::new(
            Box::new(RecordingRepoHost::new(
                Box::new(GithubRepoHost::new(&config.github)?),
                std::sync::Arc::clone(&session.repo),
            )),
            Box::new(RecordingLlmClient::new(
                Box::new(OpenAiClient::new(&config.llm)?),
                std::sync::Arc::clone(&session.llm),
            )),
            Box::new(TokioSleeper),
            Box::new(MarkdownRenderer),
        );
        Ok((ctx, session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// Each port gets its own replayer over the same cassette so that
    /// per-port streams are independent. Waits return immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let replayer = || CassetteConfig::load_port_cassette(path);
        Ok(Self::new(
            Box::new(ReplayingRepoHost::new(replayer()?)),
            Box::new(ReplayingLlmClient::new(replayer()?)),
            Box::new(InstantSleeper::default()),
            Box::new(MarkdownRenderer),
        ))
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette file use a panicking adapter
    /// that fails with a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self::new(
            match replayers.repo {
                Some(r) => Box::new(ReplayingRepoHost::new(r)),
                None => Box::new(PanickingRepoHost),
            },
            match replayers.llm {
                Some(r) => Box::new(ReplayingLlmClient::new(r)),
                None => Box::new(PanickingLlmClient),
            },
            Box::new(InstantSleeper::default()),
            Box::new(MarkdownRenderer),
        ))
    }
}

// --- Panicking adapters for unspecified ports ---

struct PanickingRepoHost;
impl RepoHost for PanickingRepoHost {
    fn list_dir<'a>(&'a self, _owner: &'a str, _repo: &'a str, _path: &'a str) -> ListFuture<'a> {
        panic!("RepoHost port not configured in CassetteConfig, no cassette loaded for repo");
    }
    fn fetch_raw<'a>(&'a self, _locator: &'a ContentLocator) -> FetchFuture<'a> {
        panic!("RepoHost port not configured in CassetteConfig, no cassette loaded for repo");
    }
}

struct PanickingLlmClient;
impl LlmClient for PanickingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        panic!("LlmClient port not configured in CassetteConfig, no cassette loaded for llm");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            tool_version: "test".into(),
            interactions,
        };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    fn listing() -> Interaction {
        Interaction {
            seq: 0,
            port: "repo".into(),
            method: "list_dir".into(),
            input: json!({"owner": "acme", "repo": "shop", "path": ""}),
            output: json!({"ok": []}),
        }
    }

    #[tokio::test]
    async fn replaying_context_from_monolithic_cassette() {
        let dir = std::env::temp_dir().join("portguide_ctx_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");
        write_cassette(&path, vec![listing()]);

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert!(ctx.repo.list_dir("acme", "shop", "").await.unwrap().is_empty());
        ctx.sleeper.sleep(std::time::Duration::from_secs(3600)).await;

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn replaying_from_per_port_cassettes() {
        let dir = std::env::temp_dir().join("portguide_ctx_test_ports");
        std::fs::create_dir_all(&dir).unwrap();
        let repo_path = dir.join("repo.cassette.yaml");
        write_cassette(&repo_path, vec![listing()]);

        let config = CassetteConfig { repo: Some(repo_path), ..CassetteConfig::default() };
        let ctx = ServiceContext::replaying_from(&config).unwrap();
        assert!(ctx.repo.list_dir("acme", "shop", "").await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let request = CompletionRequest {
            model: "m".into(),
            prompt: "p".into(),
            max_tokens: 1,
            temperature: 0.5,
        };
        drop(ctx.llm.complete(&request));
    }

    #[test]
    fn replaying_reports_missing_cassette() {
        let err = ServiceContext::replaying(Path::new("/nonexistent/cassette.yaml")).err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }
}
