//! Document renderer port turning ordered guide results into a downloadable file.

use serde::Serialize;

use crate::pipeline::crawl::SkippedDirectory;
use crate::pipeline::MigrationGuideResult;

/// A rendered, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    /// Suggested download file name.
    pub file_name: String,
    /// MIME type of `body`.
    pub content_type: String,
    /// Document bytes.
    pub body: Vec<u8>,
}

/// Renders migration guide results for one repository.
pub trait DocumentRenderer: Send + Sync {
    /// Renders `results` (already in final order) as a document for `repo_name`.
    /// `skipped` lists subtrees the crawl could not cover.
    fn render(
        &self,
        repo_name: &str,
        results: &[MigrationGuideResult],
        skipped: &[SkippedDirectory],
    ) -> RenderedDocument;
}
