//! Core library entry for the `portguide` CLI and HTTP endpoint.
//!
//! A run crawls a GitHub repository, extracts each file's dependencies,
//! splits the content into chunks, asks an LLM for a migration guide per
//! chunk, and renders the ordered guides as one document.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod request;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
/// `--help` and `--version` print to stdout and succeed.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return err.print().map_err(|e| e.to_string());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init();
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["portguide", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_succeeds_on_help_and_version() {
        assert_eq!(run(["portguide", "--help"]), Ok(()));
        assert_eq!(run(["portguide", "migrate", "--help"]), Ok(()));
        assert_eq!(run(["portguide", "--version"]), Ok(()));
    }

    #[test]
    fn run_errors_on_missing_migrate_arguments() {
        let err = run(["portguide", "migrate", "--owner", "acme"]).unwrap_err();
        assert!(err.contains("--repo"));
    }
}
