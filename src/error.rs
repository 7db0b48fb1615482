//! Run-level error taxonomy and its mapping onto HTTP-style statuses.

use thiserror::Error;

use crate::pipeline::crawl::CrawlError;
use crate::pipeline::guide::GuideError;

/// A request that cannot be processed as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// A validation error listing the required fields that were absent.
    #[must_use]
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self { message: format!("missing required fields: {}", fields.join(", ")) }
    }

    /// A validation error with a free-form message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Why a migration run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// A required credential or setting is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The request is malformed.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// The repository or a path in it does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The crawl succeeded but found nothing to migrate.
    #[error("no files found in repository {owner}/{repo}")]
    NoFilesFound {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
    },
    /// An external service could not be reached or refused us.
    #[error("could not reach external services: {0}")]
    Upstream(String),
    /// The run was cancelled before it finished.
    #[error("run cancelled")]
    Cancelled,
    /// A processing bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MigrationError {
    /// Stable machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::NoFilesFound { .. } => "no_files_found",
            Self::Upstream(_) => "upstream",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP-style status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) | Self::NoFilesFound { .. } => 404,
            Self::Upstream(_) => 502,
            Self::Cancelled => 503,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<CrawlError> for MigrationError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::NotFound(msg) => Self::NotFound(msg),
            CrawlError::Cancelled => Self::Cancelled,
            err @ (CrawlError::Unauthorized(_)
            | CrawlError::Malformed(_)
            | CrawlError::Unreachable { .. }) => Self::Upstream(err.to_string()),
        }
    }
}

impl From<GuideError> for MigrationError {
    fn from(err: GuideError) -> Self {
        match err {
            GuideError::Configuration(msg) => Self::Configuration(msg),
            GuideError::Cancelled => Self::Cancelled,
        }
    }
}
