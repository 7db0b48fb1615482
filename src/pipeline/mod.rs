//! Migration pipeline: crawl a repository, analyze and chunk each file,
//! generate a guide per unit, and render the ordered results.
//!
//! ```text
//! Idle -> Crawling -> PerFileProcessing -> Aggregating -> Done
//!   \________\______________\_________________\--> Errored
//! ```

pub mod cancel;
pub mod chunk;
pub mod crawl;
pub mod deps;
pub mod guide;
pub mod retry;

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use self::cancel::Cancellation;
use self::crawl::{FileDescriptor, RepoCrawler, SkippedDirectory};
use self::deps::DependencySet;
use self::guide::GuideGenerator;
use self::retry::{retry, RetryError};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{MigrationError, ValidationError};
use crate::ports::{FetchError, RenderedDocument};
use crate::request::MigrationRequest;

/// Guide text recorded for a file whose content could not be downloaded.
pub const FETCH_FAILURE_SENTINEL: &str =
    "An error occurred while fetching the contents of this file; no migration guide was generated.";

/// Whether guides are generated per chunk or per whole file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// One guide for every chunk of every file.
    #[default]
    PerChunk,
    /// One guide for the whole content of every file.
    PerFile,
}

/// Unrecognised granularity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown granularity {0:?}, expected \"chunk\" or \"file\"")]
pub struct ParseGranularityError(String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chunk" | "per-chunk" => Ok(Self::PerChunk),
            "file" | "per-file" => Ok(Self::PerFile),
            other => Err(ParseGranularityError(other.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerChunk => "chunk",
            Self::PerFile => "file",
        })
    }
}

/// Position of a chunk within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPart {
    /// Zero-based chunk index.
    pub index: usize,
    /// Number of chunks in the file.
    pub total: usize,
}

/// The guide produced for one processed unit (chunk or file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationGuideResult {
    /// Repo-relative path of the file.
    pub file_path: String,
    /// Dependency tokens of the whole file.
    pub dependencies: DependencySet,
    /// Generated guide, or a failure sentinel.
    pub guide_text: String,
    /// Chunk position; `None` when the guide covers the whole file.
    pub part: Option<ChunkPart>,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Results in crawl order, then chunk order.
    pub results: Vec<MigrationGuideResult>,
    /// The rendered document.
    pub document: RenderedDocument,
    /// Subtrees the crawl had to give up on.
    pub skipped_directories: Vec<SkippedDirectory>,
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Enumerating repository files.
    Crawling,
    /// Fetching, analyzing and generating guides per file.
    PerFileProcessing,
    /// Handing results to the renderer.
    Aggregating,
    /// Finished successfully.
    Done,
    /// Stopped on a non-recoverable error.
    Errored,
}

/// Runs one migration request against a [`ServiceContext`].
pub struct MigrationPipeline<'a> {
    ctx: &'a ServiceContext,
    config: &'a Config,
    cancel: Cancellation,
    state: Mutex<PipelineState>,
}

impl<'a> MigrationPipeline<'a> {
    /// Creates an idle pipeline.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a Config) -> Self {
        Self { ctx, config, cancel: Cancellation::never(), state: Mutex::new(PipelineState::Idle) }
    }

    /// Uses `cancel` to stop outbound calls when requested.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current state.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.lock().expect("pipeline state lock poisoned")
    }

    fn transition(&self, next: PipelineState) {
        let mut state = self.state.lock().expect("pipeline state lock poisoned");
        debug!(from = ?*state, to = ?next, "pipeline transition");
        *state = next;
    }

    /// Runs the request to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError`] for invalid requests, missing
    /// credentials, unreachable or refusing services, an empty repository,
    /// or cancellation. The pipeline is left in [`PipelineState::Errored`].
    pub async fn run(&self, request: &MigrationRequest) -> Result<MigrationReport, MigrationError> {
        let result = self.run_inner(request).await;
        match &result {
            Ok(report) => {
                self.transition(PipelineState::Done);
                info!(results = report.results.len(), "migration guide ready");
            }
            Err(err) => {
                self.transition(PipelineState::Errored);
                error!(kind = err.kind(), error = %err, "migration run failed");
            }
        }
        result
    }

    async fn run_inner(&self, request: &MigrationRequest) -> Result<MigrationReport, MigrationError> {
        request.validate()?;
        let settings = &self.config.pipeline;
        if settings.chunk_size == 0 {
            return Err(ValidationError::new("chunk size must be greater than zero").into());
        }

        self.transition(PipelineState::Crawling);
        info!(owner = %request.repo_owner, repo = %request.repo_name, "crawling repository");
        let crawler = RepoCrawler::new(
            self.ctx.repo.as_ref(),
            self.ctx.sleeper.as_ref(),
            settings.crawl_delay,
            settings.retry,
            self.cancel.clone(),
        );
        let outcome = crawler.crawl(&request.repo_owner, &request.repo_name, "").await?;
        if outcome.files.is_empty() {
            return Err(MigrationError::NoFilesFound {
                owner: request.repo_owner.clone(),
                repo: request.repo_name.clone(),
            });
        }

        self.transition(PipelineState::PerFileProcessing);
        info!(
            files = outcome.files.len(),
            granularity = %settings.granularity,
            "generating migration guides"
        );
        let generator = GuideGenerator::new(
            self.ctx.llm.as_ref(),
            self.ctx.sleeper.as_ref(),
            &self.config.llm,
            settings.retry,
            self.cancel.clone(),
        );
        let work: Vec<_> = outcome
            .files
            .iter()
            .map(|file| self.process_file(&generator, file, request).boxed())
            .collect();
        let per_file: Vec<Vec<MigrationGuideResult>> = stream::iter(work)
            .buffered(settings.max_concurrent_files.max(1))
            .try_collect()
            .await?;
        let results: Vec<MigrationGuideResult> = per_file.into_iter().flatten().collect();

        self.transition(PipelineState::Aggregating);
        if outcome.is_partial() {
            warn!(
                skipped = outcome.skipped_directories.len(),
                "guide covers a partial crawl"
            );
        }
        let document =
            self.ctx.renderer.render(&request.repo_name, &results, &outcome.skipped_directories);

        Ok(MigrationReport { results, document, skipped_directories: outcome.skipped_directories })
    }

    async fn process_file(
        &self,
        generator: &GuideGenerator<'_>,
        file: &FileDescriptor,
        request: &MigrationRequest,
    ) -> Result<Vec<MigrationGuideResult>, MigrationError> {
        let settings = &self.config.pipeline;
        let Some(content) = self.fetch(file).await? else {
            return Ok(vec![MigrationGuideResult {
                file_path: file.path.clone(),
                dependencies: DependencySet::new(),
                guide_text: FETCH_FAILURE_SENTINEL.to_string(),
                part: None,
            }]);
        };

        let dependencies = deps::analyze(&file.name, &content);
        let source = request.source_language.as_str();
        let target = request.target_language.as_str();

        let mut results = Vec::new();
        match settings.granularity {
            Granularity::PerChunk => {
                let chunks = split_checked(&file.path, &content, settings.chunk_size)?;
                let total = chunks.len();
                debug!(path = %file.path, chunks = total, deps = dependencies.len(), "processing file");
                for chunk in chunks {
                    let guide_text = generator.generate(&chunk.text, source, target).await?;
                    results.push(MigrationGuideResult {
                        file_path: file.path.clone(),
                        dependencies: dependencies.clone(),
                        guide_text,
                        part: Some(ChunkPart { index: chunk.index, total }),
                    });
                }
            }
            Granularity::PerFile => {
                debug!(path = %file.path, deps = dependencies.len(), "processing file");
                let guide_text = generator.generate(&content, source, target).await?;
                results.push(MigrationGuideResult {
                    file_path: file.path.clone(),
                    dependencies,
                    guide_text,
                    part: None,
                });
            }
        }
        Ok(results)
    }

    /// Downloads a file's content; `None` when it could not be fetched.
    async fn fetch(&self, file: &FileDescriptor) -> Result<Option<String>, MigrationError> {
        let result = retry(
            self.config.pipeline.retry,
            self.ctx.sleeper.as_ref(),
            &self.cancel,
            "fetch_raw",
            FetchError::is_transient,
            || self.ctx.repo.fetch_raw(&file.content_ref),
        )
        .await;

        match result {
            Ok(content) => Ok(Some(content)),
            Err(RetryError::Fatal(FetchError::Unauthorized(msg))) => {
                Err(MigrationError::Upstream(format!("content fetch unauthorized: {msg}")))
            }
            Err(RetryError::Fatal(err) | RetryError::Exhausted { last: err, .. }) => {
                warn!(path = %file.path, error = %err, "could not fetch file content");
                Ok(None)
            }
            Err(RetryError::Cancelled) => Err(MigrationError::Cancelled),
        }
    }
}

/// Splits with a chunk size already validated for this run; any failure is internal.
fn split_checked(
    path: &str,
    content: &str,
    chunk_size: usize,
) -> Result<Vec<chunk::Chunk>, MigrationError> {
    chunk::split_file(path, content, chunk_size)
        .map_err(|e| MigrationError::Internal(format!("splitting {path}: {e}")))
}
