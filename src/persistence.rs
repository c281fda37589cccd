use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{ActiveLine, JobInput, JobStatus, OutputRecord};
use crate::signal::Signal2d;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read snapshot: {0}")]
    Read(String),
}

/// Serializable snapshot of a job: everything needed to rebuild its profiles
/// and continue or inspect it in a later session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub name: String,
    pub signal: Option<Signal2d>,
    pub input: JobInput,
    pub output: Vec<OutputRecord>,
    pub active_line: ActiveLine,
    pub status: JobStatus,
    pub version: String,
}

impl JobSnapshot {
    pub fn current_version() -> String {
        env!("CARGO_PKG_VERSION").to_owned()
    }
}

/// Writes and reads job snapshots as pretty-printed JSON files, one per job
/// name, under a state directory.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    state_dir: PathBuf,
}

impl StatePersistence {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{name}.json"))
    }

    pub fn save_snapshot(&self, snapshot: &JobSnapshot) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.state_dir)?;
        let path = self.snapshot_path(&snapshot.name);
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)?;
        info!("saved job '{}' to {}", snapshot.name, path.display());
        Ok(path)
    }

    pub fn load_snapshot(&self, name: &str) -> Result<JobSnapshot, PersistenceError> {
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Err(PersistenceError::Read(format!(
                "no snapshot named '{name}' in {}",
                self.state_dir.display()
            )));
        }
        let json = fs::read_to_string(&path)?;
        let snapshot: JobSnapshot = serde_json::from_str(&json)?;
        info!("loaded job '{}' from {}", snapshot.name, path.display());
        Ok(snapshot)
    }

    pub fn has_snapshot(&self, name: &str) -> bool {
        self.snapshot_path(name).exists()
    }

    pub fn delete_snapshot(&self, name: &str) -> Result<(), PersistenceError> {
        let path = self.snapshot_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
