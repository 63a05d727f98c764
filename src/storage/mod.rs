//! Filesystem storage.
//!
//! Handles reading and writing under the data directory:
//! - League cache (versioned JSON per period and clan alias)
//! - Leaderboard and standings reports (JSONL)
//! - Per-clan summaries (JSON)

mod cache;
mod jsonl;

pub use cache::*;
pub use jsonl::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn results_root(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    /// Directory for one league period, e.g. `results/OCT`.
    pub fn results_dir(&self, period: &str) -> PathBuf {
        self.results_root().join(period)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Reject aliases and periods that would escape the results directory.
pub(crate) fn check_path_component(value: &str) -> Result<(), StorageError> {
    if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(StorageError::InvalidPath(value.to_string()));
    }
    Ok(())
}
