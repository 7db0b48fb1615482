//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// File name of the repository-host cassette inside a cassette directory.
pub const REPO_CASSETTE: &str = "repo.cassette.yaml";
/// File name of the LLM cassette inside a cassette directory.
pub const LLM_CASSETTE: &str = "llm.cassette.yaml";

/// Per-port cassette file paths. Ports without a cassette path will panic
/// if called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the repository-host port cassette file.
    pub repo: Option<PathBuf>,
    /// Path to the LLM port cassette file.
    pub llm: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the repository-host port.
    pub repo: Option<CassetteReplayer>,
    /// Replayer for the LLM port.
    pub llm: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Picks up the per-port cassettes a recording session wrote to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not a directory or holds neither cassette.
    pub fn from_dir(dir: &Path) -> Result<Self, String> {
        if !dir.is_dir() {
            return Err(format!("Cassette directory not found: {}", dir.display()));
        }
        let existing = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());
        let config = Self { repo: existing(REPO_CASSETTE), llm: existing(LLM_CASSETTE) };
        if config.repo.is_none() && config.llm.is_none() {
            return Err(format!(
                "No {REPO_CASSETTE} or {LLM_CASSETTE} in cassette directory {}",
                dir.display()
            ));
        }
        Ok(config)
    }

    /// Load a single cassette file and create a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_port_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        Ok(CassetteReplayer::new(&Cassette::load(path)?))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            repo: self.repo.as_deref().map(Self::load_port_cassette).transpose()?,
            llm: self.llm.as_deref().map(Self::load_port_cassette).transpose()?,
        })
    }
}
