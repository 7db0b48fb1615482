//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use super::replay;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Serves recorded LLM completions from a cassette, matched on the request.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let input = serde_json::to_value(request).unwrap_or_default();
        Box::pin(async move { replay(&self.replayer, "llm", "complete", &input) })
    }
}
