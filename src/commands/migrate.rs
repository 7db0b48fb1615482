//! `portguide migrate`: run one request and write the guide to disk.

use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::pipeline::cancel::Cancellation;
use crate::request::{self, MigrationRequest};

/// Arguments of one `migrate` invocation.
#[derive(Debug, Clone)]
pub struct MigrateArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Language the repository is written in.
    pub source_language: String,
    /// Language to migrate to.
    pub target_language: String,
    /// Output path; the document's own file name when absent.
    pub out: Option<PathBuf>,
}

/// Runs the migration and writes the rendered document.
///
/// Ctrl-C cancels outstanding calls and ends the run with an error.
///
/// # Errors
///
/// Returns an error string describing the failed run or the failed write.
pub async fn run(ctx: &ServiceContext, config: &Config, args: &MigrateArgs) -> Result<(), String> {
    let request = MigrationRequest {
        source_language: args.source_language.clone(),
        target_language: args.target_language.clone(),
        repo_owner: args.owner.clone(),
        repo_name: args.repo.clone(),
    };

    let (handle, cancel) = Cancellation::new();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling migration");
            handle.cancel();
        }
    });
    let outcome = request::handle(ctx, config, &request, cancel).await;
    interrupt.abort();

    let document =
        outcome.map_err(|e| format!("migration failed ({} {}): {}", e.status, e.kind, e.error))?;
    let path = args.out.clone().unwrap_or_else(|| PathBuf::from(&document.file_name));
    std::fs::write(&path, &document.body)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}
