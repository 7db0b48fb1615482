//! Live adapters for real external interactions.

pub mod github;
pub mod llm;
pub mod sleeper;

pub use github::GithubRepoHost;
pub use llm::OpenAiClient;
pub use sleeper::TokioSleeper;
