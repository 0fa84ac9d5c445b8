//! Cache directory cleanup

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Delete the regular files directly inside each directory. Subdirectories
/// are left alone and per-file failures are logged. Fails only when an
/// existing directory cannot be listed.
pub async fn clear_directories(dirs: &[PathBuf]) -> io::Result<Vec<String>> {
    let mut actions = Vec::with_capacity(dirs.len());
    for dir in dirs {
        actions.push(clear_directory(dir).await?);
    }
    Ok(actions)
}

async fn clear_directory(dir: &Path) -> io::Result<String> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(format!("Skipped {} (not found)", dir.display()));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0usize;
    let mut failed = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(t) if t.is_file() => {}
            _ => continue,
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => {
                failed += 1;
                warn!(file = %entry.path().display(), error = %e, "Failed to remove cache file");
            }
        }
    }

    info!(dir = %dir.display(), removed, failed, "Cache directory cleared");
    Ok(if failed == 0 {
        format!("Cleared {} files from {}", removed, dir.display())
    } else {
        format!(
            "Cleared {} files from {} ({} could not be removed)",
            removed,
            dir.display(),
            failed
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clears_files_but_not_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("cache");
        tokio::fs::create_dir_all(cache.join("nested")).await.unwrap();
        tokio::fs::write(cache.join("a.tmp"), b"a").await.unwrap();
        tokio::fs::write(cache.join("b.tmp"), b"b").await.unwrap();
        tokio::fs::write(cache.join("nested").join("c.tmp"), b"c").await.unwrap();

        let missing = root.path().join("uploads-temp");
        let actions = clear_directories(&[cache.clone(), missing]).await.unwrap();

        assert_eq!(actions.len(), 2);
        assert!(actions[0].starts_with("Cleared 2 files"));
        assert!(actions[1].starts_with("Skipped"));
        assert!(cache.join("nested").join("c.tmp").exists());
        assert!(!cache.join("a.tmp").exists());
    }
}
