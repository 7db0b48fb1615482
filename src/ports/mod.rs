//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the migration core and an
//! external system (repository host, LLM, wall-clock waits, document output).
//! Implementations live in `src/adapters/` and `src/render.rs`.

pub mod llm;
pub mod renderer;
pub mod repo_host;
pub mod sleeper;

pub use llm::{CompletionError, CompletionRequest, CompletionResponse, LlmClient, LlmFuture};
pub use renderer::{DocumentRenderer, RenderedDocument};
pub use repo_host::{
    ContentLocator, EntryKind, FetchError, FetchFuture, ListError, ListFuture, RepoEntry,
    RepoHost,
};
pub use sleeper::{SleepFuture, Sleeper};
