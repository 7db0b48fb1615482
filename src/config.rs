//! Runtime configuration built once from the environment and passed to each component.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::chunk::DEFAULT_CHUNK_SIZE;
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::Granularity;

const DEFAULT_GITHUB_API: &str = "https://api.github.com";
const DEFAULT_OPENAI_API: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_CRAWL_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A configuration value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    /// Environment variable name.
    pub var: &'static str,
    /// Raw value found.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Repository host settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
    /// Base URL of the REST API.
    pub api_base: String,
    /// Optional bearer token; anonymous access works for public repositories.
    pub token: Option<String>,
    /// Whole-request timeout; an expired request is a transient failure.
    pub request_timeout: Duration,
}

/// Text-generation service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Bearer API key. Checked when a completion is requested.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Completion token cap per guide.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Whole-request timeout; an expired request is a transient failure.
    pub request_timeout: Duration,
}

/// Crawl and generation policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// One guide per chunk or per file.
    pub granularity: Granularity,
    /// Pause before listing each subdirectory.
    pub crawl_delay: Duration,
    /// Retry policy for listing, fetching and generation calls.
    pub retry: RetryPolicy,
    /// Files processed at the same time; bounds outbound calls in flight.
    pub max_concurrent_files: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            granularity: Granularity::default(),
            crawl_delay: DEFAULT_CRAWL_DELAY,
            retry: RetryPolicy::default(),
            max_concurrent_files: DEFAULT_CONCURRENCY,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Repository host settings.
    pub github: GithubConfig,
    /// LLM settings.
    pub llm: LlmConfig,
    /// Pipeline policy.
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig {
                api_base: DEFAULT_GITHUB_API.into(),
                token: None,
                request_timeout: DEFAULT_HTTP_TIMEOUT,
            },
            llm: LlmConfig {
                api_base: DEFAULT_OPENAI_API.into(),
                api_key: None,
                model: DEFAULT_MODEL.into(),
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
                request_timeout: DEFAULT_HTTP_TIMEOUT,
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unset or blank variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let retry = RetryPolicy {
            max_attempts: parse_positive(get("PORTGUIDE_MAX_ATTEMPTS"), "PORTGUIDE_MAX_ATTEMPTS")?
                .unwrap_or(defaults.pipeline.retry.max_attempts),
            backoff: parse(get("PORTGUIDE_BACKOFF_MS"), "PORTGUIDE_BACKOFF_MS")?
                .map_or(defaults.pipeline.retry.backoff, Duration::from_millis),
        };
        let request_timeout =
            parse_positive(get("PORTGUIDE_HTTP_TIMEOUT_SECS"), "PORTGUIDE_HTTP_TIMEOUT_SECS")?
                .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs);

        Ok(Self {
            github: GithubConfig {
                api_base: get("PORTGUIDE_GITHUB_API").unwrap_or(defaults.github.api_base),
                token: get("GITHUB_TOKEN"),
                request_timeout,
            },
            llm: LlmConfig {
                api_base: get("PORTGUIDE_OPENAI_API").unwrap_or(defaults.llm.api_base),
                api_key: get("OPENAI_API_KEY"),
                model: get("PORTGUIDE_MODEL").unwrap_or(defaults.llm.model),
                max_tokens: parse_positive(get("PORTGUIDE_MAX_TOKENS"), "PORTGUIDE_MAX_TOKENS")?
                    .unwrap_or(defaults.llm.max_tokens),
                temperature: parse(get("PORTGUIDE_TEMPERATURE"), "PORTGUIDE_TEMPERATURE")?
                    .unwrap_or(defaults.llm.temperature),
                request_timeout,
            },
            pipeline: PipelineConfig {
                chunk_size: parse_positive(get("PORTGUIDE_CHUNK_SIZE"), "PORTGUIDE_CHUNK_SIZE")?
                    .unwrap_or(defaults.pipeline.chunk_size),
                granularity: parse(get("PORTGUIDE_GRANULARITY"), "PORTGUIDE_GRANULARITY")?
                    .unwrap_or(defaults.pipeline.granularity),
                crawl_delay: parse(get("PORTGUIDE_CRAWL_DELAY_MS"), "PORTGUIDE_CRAWL_DELAY_MS")?
                    .map_or(defaults.pipeline.crawl_delay, Duration::from_millis),
                retry,
                max_concurrent_files: parse_positive(
                    get("PORTGUIDE_CONCURRENCY"),
                    "PORTGUIDE_CONCURRENCY",
                )?
                .unwrap_or(defaults.pipeline.max_concurrent_files),
            },
        })
    }
}

fn parse<T>(raw: Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError { var, reason: e.to_string(), value })
    })
    .transpose()
}

fn parse_positive<T>(raw: Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let raw_copy = raw.clone();
    match parse::<T>(raw, var)? {
        Some(v) if v == T::default() => Err(ConfigError {
            var,
            value: raw_copy.unwrap_or_default(),
            reason: "must be greater than zero".into(),
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pipeline.chunk_size, 1500);
        assert_eq!(config.pipeline.crawl_delay, Duration::from_millis(200));
        assert_eq!(config.pipeline.retry.max_attempts, 3);
        assert_eq!(config.pipeline.retry.backoff, Duration::from_millis(1000));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.github.request_timeout, Duration::from_secs(60));
        assert_eq!(config.llm.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn http_timeout_applies_to_both_clients() {
        let config =
            Config::from_lookup(lookup(&[("PORTGUIDE_HTTP_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(config.github.request_timeout, Duration::from_secs(5));
        assert_eq!(config.llm.request_timeout, Duration::from_secs(5));

        let err =
            Config::from_lookup(lookup(&[("PORTGUIDE_HTTP_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(err.var, "PORTGUIDE_HTTP_TIMEOUT_SECS");
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "gh-token"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PORTGUIDE_CHUNK_SIZE", "800"),
            ("PORTGUIDE_GRANULARITY", "file"),
            ("PORTGUIDE_CRAWL_DELAY_MS", "0"),
            ("PORTGUIDE_TEMPERATURE", "0.2"),
        ]))
        .unwrap();

        assert_eq!(config.github.token.as_deref(), Some("gh-token"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.pipeline.chunk_size, 800);
        assert_eq!(config.pipeline.granularity, Granularity::PerFile);
        assert_eq!(config.pipeline.crawl_delay, Duration::ZERO);
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn blank_credentials_count_as_absent() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = Config::from_lookup(lookup(&[("PORTGUIDE_CHUNK_SIZE", "0")])).unwrap_err();
        assert_eq!(err.var, "PORTGUIDE_CHUNK_SIZE");
        assert!(err.reason.contains("greater than zero"));
    }

    #[test]
    fn rejects_negative_chunk_size() {
        let err = Config::from_lookup(lookup(&[("PORTGUIDE_CHUNK_SIZE", "-5")])).unwrap_err();
        assert_eq!(err.var, "PORTGUIDE_CHUNK_SIZE");
        assert_eq!(err.value, "-5");
    }

    #[test]
    fn rejects_unknown_granularity() {
        let err = Config::from_lookup(lookup(&[("PORTGUIDE_GRANULARITY", "line")])).unwrap_err();
        assert_eq!(err.var, "PORTGUIDE_GRANULARITY");
    }
}
