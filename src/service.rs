//! The long-lived inventory service tying all components together.
//!
//! One `Inventory` owns the product table for the lifetime of the
//! process: it is loaded (and healed) once at open, held in memory behind
//! a write lock, and re-read from disk only on explicit refresh. Every
//! mutation is a complete read-modify-write-append cycle under that lock,
//! so two overlapping calls can never save stale snapshots over each
//! other; an exclusive lock file extends the same guarantee across
//! processes.

use crate::assets::{AssetGenerator, CopyImageNormalizer, ImageNormalizer, NullAssetGenerator};
use crate::backup::{BackupManager, BACKUP_RETENTION};
use crate::error::{LedgerError, Result};
use crate::layout::Layout;
use crate::ledger::TransactionLog;
use crate::reports::{self, StockSummary};
use crate::store::{self, AssetManifest, ProductTable};
use crate::types::{
    self, MutationOutcome, NewProduct, ProductId, ProductPatch, ProductRecord, StockAction,
    TransactionEntry,
};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Service configuration.
#[derive(Clone, Debug)]
pub struct InventoryConfig {
    /// Data directory layout.
    pub layout: Layout,

    /// Snapshots kept before oldest-first eviction.
    pub backup_retention: usize,

    /// Whether opening the service runs the change-driven backup pass.
    pub auto_backup_on_open: bool,
}

impl InventoryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::new(root),
            backup_retention: BACKUP_RETENTION,
            auto_backup_on_open: true,
        }
    }
}

/// External collaborators plugged into the service.
///
/// Defaults are safe for headless use: no asset generation, verbatim
/// image copies.
pub struct Collaborators {
    pub assets: Box<dyn AssetGenerator + Send + Sync>,
    pub images: Box<dyn ImageNormalizer + Send + Sync>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            assets: Box::new(NullAssetGenerator),
            images: Box::new(CopyImageNormalizer),
        }
    }
}

/// The inventory ledger engine.
pub struct Inventory {
    layout: Layout,

    /// Lock file for exclusive cross-process access.
    _lock_file: File,

    /// The in-memory table; the mutex scopes every read-modify-write.
    table: Mutex<ProductTable>,

    log: TransactionLog,

    backups: BackupManager,

    collaborators: Collaborators,
}

impl Inventory {
    /// Open the service with default collaborators.
    pub fn open(config: InventoryConfig) -> Result<Self> {
        Self::open_with(config, Collaborators::default())
    }

    /// Open the service: bootstrap the layout, take the process lock, load
    /// and heal the table, and run the startup backup pass.
    ///
    /// A failed backup is reported and ignored — losing a snapshot must
    /// not block selling or restocking.
    pub fn open_with(config: InventoryConfig, collaborators: Collaborators) -> Result<Self> {
        config.layout.bootstrap()?;

        let lock_file = Self::acquire_lock(&config.layout)?;
        let table = store::open(&config.layout)?;
        let log = TransactionLog::new(config.layout.log_file());
        let backups =
            BackupManager::new(config.layout.clone()).with_retention(config.backup_retention);

        if config.auto_backup_on_open {
            if let Err(e) = backups.auto_backup() {
                warn!(error = %e, "startup backup failed, continuing");
            }
        }

        Ok(Self {
            layout: config.layout,
            _lock_file: lock_file,
            table: Mutex::new(table),
            log,
            backups,
            collaborators,
        })
    }

    fn acquire_lock(layout: &Layout) -> Result<File> {
        let lock_path = layout.root().join("LOCK");
        let lock_file = File::create(lock_path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| LedgerError::Locked)?;

        Ok(lock_file)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // --- Mutation Engine ---

    /// Apply a stock operation to one product.
    ///
    /// The quantity is the requested positive magnitude; removals and
    /// sales that would drive stock negative are clamped to zero, while
    /// the log records the full requested amount.
    ///
    /// Returns the new quantity plus a low-stock flag for the caller to
    /// surface; an unknown id fails with `NotFound` leaving store and log
    /// untouched.
    pub fn apply(
        &self,
        id: &ProductId,
        action: StockAction,
        quantity: u32,
    ) -> Result<MutationOutcome> {
        if quantity == 0 {
            return Err(LedgerError::Validation(
                "requested quantity must be positive".to_string(),
            ));
        }

        let now = types::now();
        let mut table = self.table.lock();
        let record = table
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        let prev_quantity = record.quantity;
        let prev_updated = record.last_updated;
        let new_quantity = (record.quantity as i64 + action.signed_delta(quantity)).max(0) as u32;
        record.quantity = new_quantity;
        record.last_updated = Some(now);
        let product_name = record.product_name.clone();
        let min_stock = record.min_stock;

        // Keep memory and disk in agreement if the write fails.
        if let Err(e) = table.save(&self.layout.store_file()) {
            if let Some(record) = table.get_mut(id) {
                record.quantity = prev_quantity;
                record.last_updated = prev_updated;
            }
            return Err(e);
        }

        self.log.append(&TransactionEntry {
            timestamp: now,
            product_id: id.clone(),
            product_name,
            action,
            amount: quantity,
            new_total: new_quantity,
        })?;

        Ok(MutationOutcome {
            new_quantity,
            low_stock: new_quantity <= min_stock,
        })
    }

    // --- Product Lifecycle ---

    /// Register a new product.
    ///
    /// Rejects duplicate ids and blank names before any write. An
    /// uploaded image is routed through the image normalizer to the
    /// canonical per-id location; QR/barcode generation is delegated to
    /// the asset generator and its failure is non-fatal (the reconciler
    /// adopts the files whenever they appear).
    pub fn register_product(
        &self,
        input: NewProduct,
        image: Option<&Path>,
    ) -> Result<ProductRecord> {
        if input.id.as_str().trim().is_empty() {
            return Err(LedgerError::Validation("product id is required".to_string()));
        }
        if input.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "product name is required".to_string(),
            ));
        }

        let mut table = self.table.lock();
        if table.contains(&input.id) {
            return Err(LedgerError::Validation(format!(
                "product id already exists: {}",
                input.id
            )));
        }

        let manifest = AssetManifest::for_product(&self.layout, &input.id);

        let image_path = match image {
            Some(source) => self.adopt_image(source, &manifest)?,
            None => self.layout.placeholder_file(),
        };

        if let Err(e) = self.collaborators.assets.generate(&input.id, &manifest) {
            warn!(id = %input.id, error = %e, "asset generation failed; links repair on next load");
        }

        let record = ProductRecord {
            product_id: input.id,
            product_name: input.name,
            quantity: input.quantity,
            min_stock: input.min_stock,
            cost_price: input.cost_price,
            sell_price: input.sell_price,
            last_updated: Some(types::now()),
            image_path: Some(image_path),
            qr_path: manifest
                .qr_path()
                .exists()
                .then(|| manifest.qr_path().to_path_buf()),
            barcode_path: manifest
                .barcode_path()
                .exists()
                .then(|| manifest.barcode_path().to_path_buf()),
        };

        table.insert(record.clone())?;
        if let Err(e) = table.save(&self.layout.store_file()) {
            table.remove(&record.product_id);
            return Err(e);
        }
        Ok(record)
    }

    /// Edit an existing product's fields, optionally replacing its image.
    pub fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
        image: Option<&Path>,
    ) -> Result<ProductRecord> {
        let mut table = self.table.lock();
        let record = table
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        if let Some(name) = patch.product_name {
            record.product_name = name;
        }
        if let Some(quantity) = patch.quantity {
            record.quantity = quantity;
        }
        if let Some(min_stock) = patch.min_stock {
            record.min_stock = min_stock;
        }
        if let Some(cost) = patch.cost_price {
            record.cost_price = cost;
        }
        if let Some(sell) = patch.sell_price {
            record.sell_price = sell;
        }

        if let Some(source) = image {
            let manifest = AssetManifest::for_product(&self.layout, id);
            let adopted = self.adopt_image(source, &manifest)?;
            manifest.remove_stale_images(&adopted)?;
            record.image_path = Some(adopted);
        }

        record.last_updated = Some(types::now());
        let updated = record.clone();

        table.save(&self.layout.store_file())?;
        Ok(updated)
    }

    /// Delete a product and cascade to its asset files.
    ///
    /// Asset cleanup failures are reported but do not undo the deletion.
    pub fn delete_product(&self, id: &ProductId) -> Result<ProductRecord> {
        let mut table = self.table.lock();
        let removed = table
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if let Err(e) = table.save(&self.layout.store_file()) {
            let _ = table.insert(removed);
            return Err(e);
        }

        let manifest = AssetManifest::for_product(&self.layout, id);
        if let Err(e) = manifest.remove_all() {
            warn!(id = %id, error = %e, "asset cleanup failed after delete");
        }

        Ok(removed)
    }

    /// Re-run the asset generator for a product and adopt the results.
    pub fn regenerate_assets(&self, id: &ProductId) -> Result<ProductRecord> {
        let mut table = self.table.lock();
        if !table.contains(id) {
            return Err(LedgerError::NotFound(id.clone()));
        }

        let manifest = AssetManifest::for_product(&self.layout, id);
        self.collaborators.assets.generate(id, &manifest)?;

        let record = table
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if manifest.qr_path().exists() {
            record.qr_path = Some(manifest.qr_path().to_path_buf());
        }
        if manifest.barcode_path().exists() {
            record.barcode_path = Some(manifest.barcode_path().to_path_buf());
        }
        let updated = record.clone();

        table.save(&self.layout.store_file())?;
        Ok(updated)
    }

    fn adopt_image(&self, source: &Path, manifest: &AssetManifest) -> Result<PathBuf> {
        let target = manifest.canonical_image();
        self.collaborators.images.normalize(source, target)?;
        if !target.exists() {
            return Err(LedgerError::InvalidFormat(format!(
                "image normalizer produced no file at {}",
                target.display()
            )));
        }
        Ok(target.to_path_buf())
    }

    // --- Queries ---

    pub fn get(&self, id: &ProductId) -> Option<ProductRecord> {
        self.table.lock().get(id).cloned()
    }

    pub fn products(&self) -> Vec<ProductRecord> {
        self.table.lock().records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Full transaction history, oldest first.
    pub fn history(&self) -> Result<Vec<TransactionEntry>> {
        self.log.read_all()
    }

    /// Aggregate stock position.
    pub fn summary(&self) -> StockSummary {
        reports::summarize(self.table.lock().records())
    }

    /// Discard the in-memory table and re-read it from disk, healing and
    /// reconciling again.
    pub fn refresh(&self) -> Result<()> {
        let reloaded = store::open(&self.layout)?;
        *self.table.lock() = reloaded;
        Ok(())
    }

    // --- Backups ---

    /// Run the change-driven backup pass on demand.
    pub fn auto_backup(&self) -> Result<Option<PathBuf>> {
        self.backups.auto_backup()
    }

    /// Build a downloadable archive of the current data set.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        self.backups.export_snapshot()
    }
}
