//! The request surface shared by the CLI and the HTTP endpoint.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{MigrationError, ValidationError};
use crate::pipeline::cancel::Cancellation;
use crate::pipeline::MigrationPipeline;
use crate::ports::RenderedDocument;

/// One migration request.
///
/// Accepts camelCase JSON, plus the `githubRepoOwner`/`githubRepoName`
/// spellings for the repository fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    /// Language the repository is written in.
    #[serde(default)]
    pub source_language: String,
    /// Language to migrate to.
    #[serde(default)]
    pub target_language: String,
    /// Repository owner (user or organisation).
    #[serde(default, alias = "githubRepoOwner")]
    pub repo_owner: String,
    /// Repository name.
    #[serde(default, alias = "githubRepoName")]
    pub repo_name: String,
}

impl MigrationRequest {
    /// Checks that every field is present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming each missing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<&str> = [
            ("sourceLanguage", &self.source_language),
            ("targetLanguage", &self.target_language),
            ("repoOwner", &self.repo_owner),
            ("repoName", &self.repo_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::missing_fields(&missing))
        }
    }
}

/// JSON error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// HTTP-style status code.
    pub status: u16,
    /// Machine-readable error kind.
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

impl From<&MigrationError> for ErrorPayload {
    fn from(err: &MigrationError) -> Self {
        Self { status: err.status(), kind: err.kind().to_string(), error: err.to_string() }
    }
}

/// Validates and runs `request`, returning the rendered document.
///
/// # Errors
///
/// Returns the [`ErrorPayload`] describing why no document was produced.
pub async fn handle(
    ctx: &ServiceContext,
    config: &Config,
    request: &MigrationRequest,
    cancel: Cancellation,
) -> Result<RenderedDocument, ErrorPayload> {
    request.validate().map_err(|e| ErrorPayload::from(&MigrationError::from(e)))?;
    info!(
        owner = %request.repo_owner,
        repo = %request.repo_name,
        from = %request.source_language,
        to = %request.target_language,
        "migration requested"
    );

    let pipeline = MigrationPipeline::new(ctx, config).with_cancellation(cancel);
    match pipeline.run(request).await {
        Ok(report) => Ok(report.document),
        Err(err) => Err(ErrorPayload::from(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::instant::InstantSleeper;
    use crate::adapters::replaying::{ReplayingLlmClient, ReplayingRepoHost};
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;
    use crate::render::MarkdownRenderer;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn context(interactions: Vec<Interaction>) -> ServiceContext {
        let cassette = Cassette {
            name: "request".into(),
            recorded_at: Utc::now(),
            tool_version: "test".into(),
            interactions,
        };
        ServiceContext::new(
            Box::new(ReplayingRepoHost::new(CassetteReplayer::new(&cassette))),
            Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
            Box::new(InstantSleeper::default()),
            Box::new(MarkdownRenderer),
        )
    }

    fn interaction(port: &str, method: &str, input: Value, output: Value) -> Interaction {
        Interaction { seq: 0, port: port.into(), method: method.into(), input, output }
    }

    fn listing(path: &str, output: Value) -> Interaction {
        let input = json!({"owner": "acme", "repo": "shop", "path": path});
        interaction("repo", "list_dir", input, output)
    }

    fn request() -> MigrationRequest {
        MigrationRequest {
            source_language: "Ruby".into(),
            target_language: "Rust".into(),
            repo_owner: "acme".into(),
            repo_name: "shop".into(),
        }
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn handle_future_is_send() {
        let ctx = context(vec![]);
        let config = Config::default();
        let request = request();
        assert_send(handle(&ctx, &config, &request, Cancellation::never()));
    }

    #[tokio::test]
    async fn skipped_directories_reach_the_document() {
        let broken = json!({"err": {"Transient": "broken pipe"}});
        let ctx = context(vec![
            listing("", json!({"ok": [
                {"name": "vendor", "path": "vendor", "kind": "directory", "content": null},
                {"name": "app.rb", "path": "app.rb", "kind": "file", "content": "https://raw.example/app.rb"},
            ]})),
            listing("vendor", broken.clone()),
            listing("vendor", broken.clone()),
            listing("vendor", broken),
            interaction(
                "repo",
                "fetch_raw",
                json!({"locator": "https://raw.example/app.rb"}),
                json!({"ok": "puts 1\n"}),
            ),
            interaction(
                "llm",
                "complete",
                Value::Null,
                json!({"ok": {"text": "Use println!.", "prompt_tokens": 1, "completion_tokens": 1}}),
            ),
        ]);

        let document = handle(&ctx, &Config::default(), &request(), Cancellation::never())
            .await
            .unwrap();

        let body = String::from_utf8(document.body).unwrap();
        assert!(body.contains("**Skipped directories:**"));
        assert!(body.contains("`vendor`: "));
        assert!(body.contains("Use println!."));
    }

    #[test]
    fn deserializes_original_field_names() {
        let request: MigrationRequest = serde_json::from_value(json!({
            "sourceLanguage": "PHP",
            "targetLanguage": "Rust",
            "githubRepoOwner": "acme",
            "githubRepoName": "shop",
        }))
        .unwrap();
        assert_eq!(request.repo_owner, "acme");
        assert_eq!(request.repo_name, "shop");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn missing_fields_are_listed() {
        let request: MigrationRequest =
            serde_json::from_value(json!({"sourceLanguage": "PHP", "repoName": " "})).unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.message, "missing required fields: targetLanguage, repoOwner, repoName");
    }

    #[test]
    fn error_payload_carries_status_and_kind() {
        let err = MigrationError::NoFilesFound { owner: "acme".into(), repo: "shop".into() };
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.status, 404);
        assert_eq!(payload.kind, "no_files_found");
        assert!(payload.error.contains("acme/shop"));
    }
}
