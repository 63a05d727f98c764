//! JSONL (JSON Lines) report files.
//!
//! Each line is a valid JSON object representing one row: a ranked player
//! or a clan standing.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{check_path_component, StorageConfig, StorageError};

/// Report files written per clan and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFile {
    Players,
    Standings,
    Summary,
}

impl ReportFile {
    /// File name for a clan alias.
    pub fn filename(&self, alias: &str) -> String {
        match self {
            ReportFile::Players => format!("{}_players.jsonl", alias),
            ReportFile::Standings => format!("{}_standings.jsonl", alias),
            ReportFile::Summary => format!("{}_summary.json", alias),
        }
    }
}

/// Path of a report file.
pub fn report_path(
    config: &StorageConfig,
    report: ReportFile,
    period: &str,
    alias: &str,
) -> Result<PathBuf, StorageError> {
    check_path_component(period)?;
    check_path_component(alias)?;
    Ok(config.results_dir(period).join(report.filename(alias)))
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a clan's report in a period.
    pub fn for_report(
        config: &StorageConfig,
        report: ReportFile,
        period: &str,
        alias: &str,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(report_path(config, report, period, alias)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write rows, replacing the entire file.
    pub fn write_all(&self, rows: &[T]) -> Result<usize, StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for row in rows {
            let json = serde_json::to_string(row)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Wrote {} rows to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a clan's report in a period.
    pub fn for_report(
        config: &StorageConfig,
        report: ReportFile,
        period: &str,
        alias: &str,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(report_path(config, report, period, alias)?))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all rows from the file. Unparseable lines are skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", index + 1, self.path, e);
                }
            }
        }

        debug!("Read {} rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }
}

/// Write a single pretty-printed JSON document.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// Periods with stored results, sorted by name.
pub fn list_periods(config: &StorageConfig) -> Result<Vec<String>, StorageError> {
    let dir = config.results_root();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut periods = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                periods.push(name.to_string());
            }
        }
    }

    periods.sort();
    Ok(periods)
}
