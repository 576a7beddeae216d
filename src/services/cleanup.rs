//! Retention sweeper for the upload tree

use chrono::{DateTime, Duration, Utc};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// Delete upload files older than `retention_hours` every `interval_secs`.
pub async fn run_cleanup_worker(uploads_dir: PathBuf, retention_hours: u64, interval_secs: u64) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

    tracing::info!(
        "[cleanup] Worker starting ({}h retention, {}s interval)",
        retention_hours,
        interval_secs
    );

    loop {
        interval.tick().await;

        let cutoff = retention_cutoff(Utc::now(), retention_hours);
        match sweep(&uploads_dir, cutoff).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("[cleanup] Removed {} expired uploads", removed),
            Err(e) => tracing::error!("[cleanup] Sweep failed: {}", e),
        }
    }
}

/// Oldest modification time kept. Windows too long for chrono keep everything.
pub fn retention_cutoff(now: DateTime<Utc>, retention_hours: u64) -> DateTime<Utc> {
    i64::try_from(retention_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Metadata without following links; `None` once the entry is gone.
async fn entry_metadata(path: &Path) -> io::Result<Option<Metadata>> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("[cleanup] {} vanished before it was checked", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Remove every regular file under `root` last modified before `cutoff`.
/// Returns the number of files removed.
pub async fn sweep(root: &Path, cutoff: DateTime<Utc>) -> io::Result<usize> {
    let mut removed = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let Some(meta) = entry_metadata(&entry.path()).await? else {
                continue;
            };
            if meta.is_dir() {
                pending.push(entry.path());
                continue;
            }

            let modified: DateTime<Utc> = meta.modified()?.into();
            if modified < cutoff {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(
                        "[cleanup] Failed to remove {}: {}",
                        entry.path().display(),
                        e
                    ),
                }
            }
        }
    }

    Ok(removed)
}
