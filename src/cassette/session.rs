//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::config::{LLM_CASSETTE, REPO_CASSETTE};
use super::recorder::CassetteRecorder;

/// Manages per-port `CassetteRecorder` instances for a recording session.
///
/// Each port gets its own recorder writing to a separate cassette file in a
/// timestamped directory.
pub struct RecordingSession {
    /// Recorder for repository-host interactions.
    pub repo: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for LLM interactions.
    pub llm: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session under `base/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamped directory already exists or
    /// cannot be created.
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let make_recorder = |file: &str, port: &str| -> Arc<Mutex<CassetteRecorder>> {
            let name = format!("{timestamp}-{port}");
            Arc::new(Mutex::new(CassetteRecorder::new(output_dir.join(file), name)))
        };

        Ok(Self {
            repo: make_recorder(REPO_CASSETTE, "repo"),
            llm: make_recorder(LLM_CASSETTE, "llm"),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish all recorders and write cassette files to disk.
    ///
    /// The recording adapters holding the recorders must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds a recorder or any cassette
    /// file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            Ok(())
        }

        finish_one(self.repo, "repo")?;
        finish_one(self.llm, "llm")?;
        Ok(self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;
    use serde_json::json;

    #[test]
    fn session_writes_both_cassettes() {
        let base = std::env::temp_dir().join("portguide_session_test");
        let session = RecordingSession::new(&base).unwrap();
        assert!(session.output_dir().exists());

        session.repo.lock().unwrap().record(
            "repo",
            "list_dir",
            json!({"owner": "o", "repo": "r", "path": ""}),
            json!({"ok": []}),
        );

        let dir = session.finish().unwrap();
        assert!(dir.join(REPO_CASSETTE).is_file());
        assert!(dir.join(LLM_CASSETTE).is_file());

        let config = CassetteConfig::from_dir(&dir).unwrap();
        assert!(config.repo.is_some() && config.llm.is_some());

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn finish_fails_while_an_adapter_holds_a_recorder() {
        let base = std::env::temp_dir().join("portguide_session_test_held");
        let session = RecordingSession::new(&base).unwrap();
        let held = Arc::clone(&session.llm);
        let err = session.finish().unwrap_err();
        assert!(err.contains("still has references"));
        drop(held);
        let _ = std::fs::remove_dir_all(&base);
    }
}
