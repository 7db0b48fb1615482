//! Live adapter for the `LlmClient` port using the OpenAI chat completions API.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::ports::{CompletionError, CompletionRequest, CompletionResponse, LlmClient, LlmFuture};

/// Live LLM client that calls an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Creates a client for `config.api_base`. A missing key is reported
    /// when a completion is requested, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("Failed to build OpenAI HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }
}

/// Request body sent to the chat completions API.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// A single message in the request.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Top-level response from the chat completions API.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token usage reported by the API.
#[derive(Deserialize, Default)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Error response from the API.
#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn classify_status(status: StatusCode, body: String) -> CompletionError {
    let msg = serde_json::from_str::<OpenAiError>(&body).map(|e| e.error.message).unwrap_or(body);
    let msg = format!("OpenAI API error ({}): {msg}", status.as_u16());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Unauthorized(msg),
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(msg),
        _ => CompletionError::Transient(msg),
    }
}

fn parse_response(body: &str) -> Result<CompletionResponse, CompletionError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        CompletionError::Transient(format!("Failed to parse OpenAI API response: {e}"))
    })?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::Transient("OpenAI API returned no choices".into()))?;
    Ok(CompletionResponse {
        text: text.trim().to_string(),
        prompt_tokens: parsed.usage.prompt_tokens,
        completion_tokens: parsed.usage.completion_tokens,
    })
}

impl LlmClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or_else(|| {
                CompletionError::MissingCredentials("OPENAI_API_KEY is not set".into())
            })?;

            let body = ChatRequest {
                model: &request.model,
                messages: vec![ChatMessage { role: "user", content: &request.prompt }],
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            };

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| CompletionError::Transient(format!("OpenAI API request failed: {e}")))?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| {
                CompletionError::Transient(format!("Failed to read OpenAI API response: {e}"))
            })?;

            if !status.is_success() {
                return Err(classify_status(status, response_text));
            }
            parse_response(&response_text)
        })
    }
}
