//! Backup files on disk
//!
//! Files are named `backup-<ISO timestamp, ':' and '.' replaced by '-'>.json`
//! and are never overwritten. Every path handed to the filesystem is built
//! from a name that matched the pattern first.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::documents::{BackupHeader, CollectionCounts};
use crate::domain::{DomainError, DomainResult};

static BACKUP_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^backup-\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}-\d{3}Z\.json$")
        .expect("valid backup filename regex")
});

const FILENAME_TIME_FORMAT: &str = "backup-%Y-%m-%dT%H-%M-%S-%3fZ.json";

pub fn backup_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("backup-{}.json", stamp)
}

pub fn is_backup_filename(name: &str) -> bool {
    BACKUP_FILENAME_RE.is_match(name)
}

/// Creation time encoded in a backup filename.
pub fn filename_timestamp(name: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(name, FILENAME_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `1536` -> `1.5 KB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// `None` when the file could not be read or parsed.
    pub collections: Option<CollectionCounts>,
}

#[derive(Debug, Clone, Default)]
pub struct ClearOutcome {
    pub deleted: usize,
    pub freed_bytes: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` as a new backup file. Content goes to a uniquely named
    /// hidden temp file first and is then hard-linked under the backup name,
    /// which fails when that name already exists. A failed write never leaves
    /// a file under a backup name. Returns the size written.
    pub async fn write_new(&self, filename: &str, bytes: &[u8]) -> io::Result<u64> {
        if !is_backup_filename(filename) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a backup filename: {}", filename),
            ));
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.dir.join(filename);
        let temp = self
            .dir
            .join(format!(".{}.{}.tmp", filename, uuid::Uuid::new_v4().simple()));

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::hard_link(&temp, &target).await
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(&temp).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(file = %temp.display(), error = %e, "Failed to remove temp backup file");
            }
        }
        result?;
        Ok(bytes.len() as u64)
    }

    /// Every backup file in the directory, newest first. A missing directory
    /// is an empty history.
    pub async fn list(&self) -> io::Result<Vec<BackupEntry>> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e),
        };

        while let Some(entry) = dir.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !is_backup_filename(&filename) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(file = %filename, error = %e, "Cannot stat backup file");
                    continue;
                }
            };
            let created_at = filename_timestamp(&filename)
                .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from))
                .unwrap_or_else(Utc::now);

            entries.push(BackupEntry {
                filename,
                created_at,
                size_bytes: metadata.len(),
                collections: None,
            });
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Most recent `limit` backups with their collection counts.
    pub async fn history(&self, limit: usize) -> io::Result<Vec<BackupEntry>> {
        let mut entries = self.list().await?;
        entries.truncate(limit);
        for entry in &mut entries {
            entry.collections = self.read_counts(&entry.filename).await;
        }
        Ok(entries)
    }

    async fn read_counts(&self, filename: &str) -> Option<CollectionCounts> {
        let bytes = match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %filename, error = %e, "Cannot read backup file");
                return None;
            }
        };
        match serde_json::from_slice::<BackupHeader>(&bytes) {
            Ok(header) => Some(header.collections),
            Err(e) => {
                warn!(file = %filename, error = %e, "Backup file is not valid JSON");
                None
            }
        }
    }

    /// Delete one backup. The name is validated before any filesystem access.
    pub async fn delete(&self, filename: &str) -> DomainResult<u64> {
        if !is_backup_filename(filename) {
            return Err(DomainError::Validation("Invalid backup filename".to_string()));
        }
        let path = self.dir.join(filename);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DomainError::not_found("Backup file", "filename", filename));
            }
            Err(e) => return Err(DomainError::operation("Failed to delete backup", e)),
        };
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| DomainError::operation("Failed to delete backup", e))?;
        Ok(metadata.len())
    }

    /// Delete every backup file, continuing past individual failures.
    pub async fn clear(&self) -> io::Result<ClearOutcome> {
        let mut outcome = ClearOutcome::default();
        for entry in self.list().await? {
            match tokio::fs::remove_file(self.dir.join(&entry.filename)).await {
                Ok(()) => {
                    outcome.deleted += 1;
                    outcome.freed_bytes += entry.size_bytes;
                }
                Err(e) => {
                    warn!(file = %entry.filename, error = %e, "Failed to delete backup");
                    outcome.errors.push(format!("{}: {}", entry.filename, e));
                }
            }
        }
        Ok(outcome)
    }

    /// Keep the newest `keep` backups and delete the rest. Returns how many
    /// files were removed; failures are logged only.
    pub async fn prune(&self, keep: usize) -> usize {
        let entries = match self.list().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Cannot list backups for retention");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.into_iter().skip(keep) {
            match tokio::fs::remove_file(self.dir.join(&entry.filename)).await {
                Ok(()) => {
                    debug!(file = %entry.filename, "Pruned old backup");
                    removed += 1;
                }
                Err(e) => warn!(file = %entry.filename, error = %e, "Failed to prune backup"),
            }
        }
        removed
    }
}
