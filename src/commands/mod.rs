//! Command dispatch and handlers.

pub mod migrate;
pub mod serve;

use std::env;
use std::path::{Path, PathBuf};

use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;

/// Environment variable naming a directory to record cassettes under.
pub const RECORD_ENV: &str = "PORTGUIDE_RECORD";
/// Environment variable naming a cassette file or directory to replay.
pub const REPLAY_ENV: &str = "PORTGUIDE_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// When `PORTGUIDE_REPLAY` is set, all port interactions are served from
/// cassettes. Otherwise, when `PORTGUIDE_RECORD` is set to a directory path,
/// all port interactions are recorded to per-port cassette files under it.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the selected
/// command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let config = Config::from_env().map_err(|e| e.to_string())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let (ctx, session) = select_context(&config)?;
    let result = runtime.block_on(dispatch_with_context(command, ctx, config));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        finish_recording(session)?;
    }

    result
}

fn select_context(config: &Config) -> Result<(ServiceContext, Option<RecordingSession>), String> {
    if let Some(path) = non_empty_var(REPLAY_ENV) {
        return Ok((replaying_context(Path::new(&path))?, None));
    }
    if let Some(path) = non_empty_var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording_at(config, &PathBuf::from(path))?;
        return Ok((ctx, Some(session)));
    }
    Ok((ServiceContext::live(config)?, None))
}

fn replaying_context(path: &Path) -> Result<ServiceContext, String> {
    if path.is_dir() {
        ServiceContext::replaying_from(&CassetteConfig::from_dir(path)?)
    } else {
        ServiceContext::replaying(path)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Dispatch a command with the given service context. The context is
/// consumed so recording adapters release their recorders on return.
async fn dispatch_with_context(
    command: &Command,
    ctx: ServiceContext,
    config: Config,
) -> Result<(), String> {
    match command {
        Command::Migrate {
            owner,
            repo,
            source_language,
            target_language,
            out,
            chunk_size,
            granularity,
        } => {
            let mut config = config;
            if let Some(size) = chunk_size {
                config.pipeline.chunk_size = *size;
            }
            if let Some(granularity) = granularity {
                config.pipeline.granularity = *granularity;
            }
            let args = migrate::MigrateArgs {
                owner: owner.clone(),
                repo: repo.clone(),
                source_language: source_language.clone(),
                target_language: target_language.clone(),
                out: out.clone(),
            };
            migrate::run(&ctx, &config, &args).await
        }
        Command::Serve { addr } => serve::run(ctx, config, *addr).await,
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
