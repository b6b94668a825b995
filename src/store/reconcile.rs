//! Asset-link reconciliation.
//!
//! Product rows reference their image, QR, and barcode files by path. The
//! files are produced by external collaborators, so links can dangle after
//! a restore, a manual copy, or a crashed generation run. The reconciler
//! repairs links by probing the canonical per-id locations declared in the
//! [`AssetManifest`]; it never creates or modifies asset files itself.

use crate::layout::Layout;
use crate::store::table::ProductTable;
use crate::types::ProductId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered image extension candidates consulted during repair.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Canonical on-disk locations for one product's generated assets.
#[derive(Clone, Debug)]
pub struct AssetManifest {
    image_candidates: Vec<PathBuf>,
    qr: PathBuf,
    barcode: PathBuf,
    placeholder: PathBuf,
}

impl AssetManifest {
    pub fn for_product(layout: &Layout, id: &ProductId) -> Self {
        let image_candidates = IMAGE_EXTENSIONS
            .iter()
            .map(|ext| layout.image_dir().join(format!("{id}.{ext}")))
            .collect();
        Self {
            image_candidates,
            qr: layout.qr_dir().join(format!("{id}.png")),
            barcode: layout.barcode_dir().join(format!("{id}.png")),
            placeholder: layout.placeholder_file(),
        }
    }

    /// The canonical image path: the first (highest-priority) candidate.
    /// Normalized uploads are written here.
    pub fn canonical_image(&self) -> &Path {
        &self.image_candidates[0]
    }

    /// The first candidate that exists on disk, in declared priority order.
    pub fn existing_image(&self) -> Option<&Path> {
        self.image_candidates
            .iter()
            .find(|p| p.exists())
            .map(PathBuf::as_path)
    }

    pub fn qr_path(&self) -> &Path {
        &self.qr
    }

    pub fn barcode_path(&self) -> &Path {
        &self.barcode
    }

    pub fn placeholder(&self) -> &Path {
        &self.placeholder
    }

    /// Delete every asset belonging to this product. Missing files are not
    /// an error; used by the delete cascade.
    pub fn remove_all(&self) -> io::Result<()> {
        for path in self
            .image_candidates
            .iter()
            .chain([&self.qr, &self.barcode])
        {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Delete image candidates other than `keep`, so a replaced upload does
    /// not leave a stale file under a different extension.
    pub fn remove_stale_images(&self, keep: &Path) -> io::Result<()> {
        for path in &self.image_candidates {
            if path == keep {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Repair dangling or missing asset links across the whole table.
///
/// Idempotent: re-running on an already-reconciled table changes nothing.
/// Returns the number of fields changed; the table is marked dirty when
/// that is non-zero so the caller persists the repairs.
pub fn reconcile(table: &mut ProductTable, layout: &Layout) -> usize {
    let mut changed = 0;

    for record in table.iter_mut() {
        let manifest = AssetManifest::for_product(layout, &record.product_id);

        let image_ok = record
            .image_path
            .as_deref()
            .map(Path::exists)
            .unwrap_or(false);
        if !image_ok {
            let adopted: PathBuf = manifest
                .existing_image()
                .unwrap_or_else(|| manifest.placeholder())
                .to_path_buf();
            if record.image_path.as_deref() != Some(adopted.as_path()) {
                debug!(id = %record.product_id, path = %adopted.display(), "re-linked image");
                record.image_path = Some(adopted);
                changed += 1;
            }
        }

        if manifest.qr_path().exists()
            && record.qr_path.as_deref() != Some(manifest.qr_path())
        {
            debug!(id = %record.product_id, "re-linked qr code");
            record.qr_path = Some(manifest.qr_path().to_path_buf());
            changed += 1;
        }

        if manifest.barcode_path().exists()
            && record.barcode_path.as_deref() != Some(manifest.barcode_path())
        {
            debug!(id = %record.product_id, "re-linked barcode");
            record.barcode_path = Some(manifest.barcode_path().to_path_buf());
            changed += 1;
        }
    }

    if changed > 0 {
        table.mark_dirty();
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::table::ProductTable;
    use crate::types::ProductRecord;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (Layout, ProductTable) {
        let layout = Layout::new(dir.path().join("data"));
        layout.bootstrap().unwrap();
        let table = ProductTable::load(&layout.store_file()).unwrap();
        (layout, table)
    }

    fn bare_record(id: &str) -> ProductRecord {
        ProductRecord {
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            quantity: 1,
            min_stock: 0,
            cost_price: Decimal::ZERO,
            sell_price: Decimal::ZERO,
            last_updated: None,
            image_path: None,
            qr_path: None,
            barcode_path: None,
        }
    }

    #[test]
    fn test_missing_image_falls_back_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let (layout, mut table) = setup(&dir);
        table.insert(bare_record("1001")).unwrap();

        let changed = reconcile(&mut table, &layout);
        assert_eq!(changed, 1);

        let rec = table.get(&ProductId::new("1001")).unwrap();
        assert_eq!(rec.image_path.as_deref(), Some(layout.placeholder_file().as_path()));
    }

    #[test]
    fn test_adopts_image_by_extension_priority() {
        let dir = TempDir::new().unwrap();
        let (layout, mut table) = setup(&dir);
        table.insert(bare_record("1001")).unwrap();

        // jpg exists; png does not, so jpg wins despite lower priority.
        std::fs::write(layout.image_dir().join("1001.jpg"), b"jpg").unwrap();
        reconcile(&mut table, &layout);
        assert_eq!(
            table.get(&ProductId::new("1001")).unwrap().image_path.as_deref(),
            Some(layout.image_dir().join("1001.jpg").as_path())
        );

        // Once a png appears and the jpg is gone, the link is repaired again.
        std::fs::remove_file(layout.image_dir().join("1001.jpg")).unwrap();
        std::fs::write(layout.image_dir().join("1001.png"), b"png").unwrap();
        reconcile(&mut table, &layout);
        assert_eq!(
            table.get(&ProductId::new("1001")).unwrap().image_path.as_deref(),
            Some(layout.image_dir().join("1001.png").as_path())
        );
    }

    #[test]
    fn test_adopts_generated_qr_and_barcode() {
        let dir = TempDir::new().unwrap();
        let (layout, mut table) = setup(&dir);
        table.insert(bare_record("1001")).unwrap();

        std::fs::write(layout.qr_dir().join("1001.png"), b"qr").unwrap();
        std::fs::write(layout.barcode_dir().join("1001.png"), b"bar").unwrap();

        let changed = reconcile(&mut table, &layout);
        // image -> placeholder, qr, barcode
        assert_eq!(changed, 3);

        let rec = table.get(&ProductId::new("1001")).unwrap();
        assert_eq!(rec.qr_path.as_deref(), Some(layout.qr_dir().join("1001.png").as_path()));
        assert_eq!(
            rec.barcode_path.as_deref(),
            Some(layout.barcode_dir().join("1001.png").as_path())
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (layout, mut table) = setup(&dir);
        table.insert(bare_record("1001")).unwrap();
        table.insert(bare_record("1002")).unwrap();
        std::fs::write(layout.qr_dir().join("1001.png"), b"qr").unwrap();

        assert!(reconcile(&mut table, &layout) > 0);
        table.save(&layout.store_file()).unwrap();

        assert_eq!(reconcile(&mut table, &layout), 0);
        assert!(!table.is_dirty());
    }

    #[test]
    fn test_remove_all_ignores_missing_files() {
        let dir = TempDir::new().unwrap();
        let (layout, _) = setup(&dir);
        let manifest = AssetManifest::for_product(&layout, &ProductId::new("1001"));

        std::fs::write(layout.qr_dir().join("1001.png"), b"qr").unwrap();
        manifest.remove_all().unwrap();
        assert!(!layout.qr_dir().join("1001.png").exists());

        // Nothing left on disk; still fine.
        manifest.remove_all().unwrap();
    }
}
