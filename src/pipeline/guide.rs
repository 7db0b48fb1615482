//! Migration guide generation for one chunk or file of code.

use thiserror::Error;
use tracing::{debug, warn};

use super::cancel::Cancellation;
use super::retry::{retry, RetryError, RetryPolicy};
use crate::config::LlmConfig;
use crate::ports::{CompletionError, CompletionRequest, LlmClient, Sleeper};

/// Guide text recorded when every generation attempt failed.
pub const GUIDE_FAILURE_SENTINEL: &str =
    "An error occurred while generating the migration guide for this file chunk.";

/// Generation failures that must stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuideError {
    /// The generation service has no credentials configured.
    #[error("generation service is not configured: {0}")]
    Configuration(String),
    /// Cancellation was requested.
    #[error("generation cancelled")]
    Cancelled,
}

/// Builds the prompt asking for a migration guide of `code`.
#[must_use]
pub fn build_prompt(code: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Create a detailed migration guide for migrating the following code from \
         {source_language} to {target_language}. Consider syntax differences, best \
         practices, and libraries for the migration.\n\n{code}"
    )
}

/// Produces migration guides through an [`LlmClient`].
pub struct GuideGenerator<'a> {
    llm: &'a dyn LlmClient,
    sleeper: &'a dyn Sleeper,
    settings: &'a LlmConfig,
    retry: RetryPolicy,
    cancel: Cancellation,
}

impl<'a> GuideGenerator<'a> {
    /// Creates a generator using the model parameters in `settings`.
    #[must_use]
    pub fn new(
        llm: &'a dyn LlmClient,
        sleeper: &'a dyn Sleeper,
        settings: &'a LlmConfig,
        retry: RetryPolicy,
        cancel: Cancellation,
    ) -> Self {
        Self { llm, sleeper, settings, retry, cancel }
    }

    /// The completion request sent for `code`.
    #[must_use]
    pub fn request_for(
        &self,
        code: &str,
        source_language: &str,
        target_language: &str,
    ) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            prompt: build_prompt(code, source_language, target_language),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Generates a guide for `code`.
    ///
    /// Any service failure is retried per the policy; when attempts run out
    /// the result is [`GUIDE_FAILURE_SENTINEL`] so the run can continue.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::Configuration`] immediately when credentials are
    /// missing, and [`GuideError::Cancelled`] on cancellation.
    pub async fn generate(
        &self,
        code: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, GuideError> {
        let request = self.request_for(code, source_language, target_language);
        let result = retry(
            self.retry,
            self.sleeper,
            &self.cancel,
            "complete",
            |err| !matches!(err, CompletionError::MissingCredentials(_)),
            || self.llm.complete(&request),
        )
        .await;

        match result {
            Ok(response) => {
                debug!(
                    prompt_tokens = response.prompt_tokens,
                    completion_tokens = response.completion_tokens,
                    "guide generated"
                );
                Ok(response.text)
            }
            Err(RetryError::Fatal(CompletionError::MissingCredentials(msg))) => {
                Err(GuideError::Configuration(msg))
            }
            Err(RetryError::Fatal(err) | RetryError::Exhausted { last: err, .. }) => {
                warn!(error = %err, "guide generation failed, recording failure text");
                Ok(GUIDE_FAILURE_SENTINEL.to_string())
            }
            Err(RetryError::Cancelled) => Err(GuideError::Cancelled),
        }
    }
}
