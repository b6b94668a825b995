//! Change-driven snapshots with rotation.

use crate::backup::archive::archive_paths;
use crate::error::Result;
use crate::layout::Layout;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Maximum number of retained snapshots before oldest-first eviction.
pub const BACKUP_RETENTION: usize = 10;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".tar.gz";

/// Produces and rotates point-in-time archives of the store, log, config,
/// branding images, and asset directories.
///
/// Snapshots read the live files without coordinating with concurrent
/// mutations; consistency between bundled files is best-effort.
pub struct BackupManager {
    layout: Layout,
    retention: usize,
}

impl BackupManager {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            retention: BACKUP_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// The fixed file set every snapshot bundles.
    fn bundle(&self) -> Vec<PathBuf> {
        vec![
            self.layout.store_file(),
            self.layout.log_file(),
            self.layout.config_file(),
            self.layout.logo_file(),
            self.layout.placeholder_file(),
            self.layout.image_dir(),
            self.layout.qr_dir(),
            self.layout.barcode_dir(),
        ]
    }

    /// Snapshot the store if it changed since the latest snapshot.
    ///
    /// No store file, or no change since the most recent snapshot, is a
    /// no-op returning `None` — repeated calls without intervening writes
    /// create nothing. On success the retention window is enforced.
    pub fn auto_backup(&self) -> Result<Option<PathBuf>> {
        let store = self.layout.store_file();
        if !store.exists() {
            return Ok(None);
        }

        if let Some(latest) = self.snapshots()?.last() {
            let snapshot_time = fs::metadata(latest)?.modified()?;
            let store_time = fs::metadata(&store)?.modified()?;
            if store_time <= snapshot_time {
                return Ok(None);
            }
        }

        let name = format!(
            "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.layout.backup_dir().join(name);

        let bytes = archive_paths(self.layout.root(), &self.bundle())?;
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "snapshot created");

        self.prune()?;
        Ok(Some(path))
    }

    /// Build the snapshot file set into an in-memory archive for download.
    /// Does not touch retention or the auto-backup cadence.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        archive_paths(self.layout.root(), &self.bundle())
    }

    /// Existing snapshots, oldest first. Names encode creation time, so
    /// lexicographic order is creation order.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        let dir = self.layout.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut snapshots: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(BACKUP_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();
        snapshots.sort();
        Ok(snapshots)
    }

    /// Evict snapshots beyond the retention window, oldest first.
    pub fn prune(&self) -> Result<usize> {
        let snapshots = self.snapshots()?;
        let mut removed = 0;
        if snapshots.len() > self.retention {
            for oldest in &snapshots[..snapshots.len() - self.retention] {
                fs::remove_file(oldest)?;
                debug!(path = %oldest.display(), "snapshot evicted");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
