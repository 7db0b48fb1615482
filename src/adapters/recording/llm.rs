//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::ReplayingLlmClient;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;
    use crate::ports::CompletionError;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn records_request_and_typed_error() {
        let inner = Cassette {
            name: "inner".into(),
            recorded_at: Utc::now(),
            tool_version: "test".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "llm".into(),
                method: "complete".into(),
                input: serde_json::Value::Null,
                output: json!({"err": {"RateLimited": "slow down"}}),
            }],
        };
        let dir = std::env::temp_dir().join("portguide_recording_llm_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("llm.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "record")));

        let client = RecordingLlmClient::new(
            Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&inner))),
            Arc::clone(&recorder),
        );
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            prompt: "migrate".into(),
            max_tokens: 500,
            temperature: 0.5,
        };
        let err = client.complete(&request).await.unwrap_err();
        assert_eq!(err, CompletionError::RateLimited("slow down".into()));
        drop(client);

        Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();
        let recorded = Cassette::load(&path).unwrap();
        let interaction = &recorded.interactions[0];
        assert_eq!(interaction.input, serde_json::to_value(&request).unwrap());
        assert_eq!(interaction.output, json!({"err": {"RateLimited": "slow down"}}));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
