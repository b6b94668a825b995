//! Gzip-compressed tar building for snapshots.

use crate::error::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Bundle the given files and directories (recursively) into an in-memory
/// `.tar.gz`, preserving paths relative to `root`.
///
/// Missing entries are skipped: a backup must not fail because the logo
/// or an asset folder has not been created yet. Unreadable files are
/// skipped as well; snapshots are best-effort relative to concurrent
/// writes, not crash-consistent.
pub(crate) fn archive_paths(root: &Path, paths: &[PathBuf]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(false);

    for base in paths {
        if !base.exists() {
            continue;
        }
        for entry in WalkDir::new(base).sort_by(|a, b| a.path().cmp(b.path())) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(%err, "skipping path during archive walk");
                    continue;
                }
            };
            let path = entry.path();
            let rel = match path.strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            if entry.file_type().is_dir() {
                builder.append_dir(rel, path)?;
            } else if entry.file_type().is_file() {
                let mut file = match File::open(path) {
                    Ok(file) => file,
                    Err(err) => {
                        debug!(path = %path.display(), %err, "skipping unreadable file during archive");
                        continue;
                    }
                };
                builder.append_file(rel, &mut file)?;
            }
        }
    }

    builder.finish()?;
    let tar_bytes = builder.into_inner()?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use tempfile::TempDir;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_relative_layout_preserved() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("inventory.csv"), "header\n").unwrap();
        fs::create_dir_all(root.join("qr_codes")).unwrap();
        fs::write(root.join("qr_codes/1001.png"), b"qr").unwrap();

        let bytes = archive_paths(
            root,
            &[root.join("inventory.csv"), root.join("qr_codes")],
        )
        .unwrap();

        let names = entry_names(&bytes);
        assert!(names.contains(&"inventory.csv".to_string()));
        assert!(names.contains(&"qr_codes/1001.png".to_string()));
    }

    #[test]
    fn test_missing_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("inventory.csv"), "header\n").unwrap();

        let bytes = archive_paths(
            root,
            &[root.join("inventory.csv"), root.join("logo.png")],
        )
        .unwrap();

        let names = entry_names(&bytes);
        assert_eq!(names, vec!["inventory.csv".to_string()]);
    }
}
