//! Backup cadence and retention tests.

use flate2::read::GzDecoder;
use rust_decimal::Decimal;
use stockledger::{
    BackupManager, Collaborators, Inventory, InventoryConfig, Layout, NewProduct, StockAction,
    BACKUP_RETENTION,
};
use tempfile::TempDir;

fn test_inventory(dir: &TempDir) -> Inventory {
    let mut config = InventoryConfig::new(dir.path().join("data"));
    config.auto_backup_on_open = false;
    Inventory::open_with(config, Collaborators::default()).unwrap()
}

fn widget() -> NewProduct {
    NewProduct::new("1001", "Widget")
        .with_quantity(10)
        .with_min_stock(2)
        .with_prices(Decimal::new(100, 2), Decimal::new(200, 2))
}

fn snapshot_names(layout: &Layout) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(layout.backup_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_consecutive_backups_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let inventory = test_inventory(&dir);
    inventory.register_product(widget(), None).unwrap();

    assert!(inventory.auto_backup().unwrap().is_some());
    // No intervening store modification: exactly one snapshot in total.
    assert!(inventory.auto_backup().unwrap().is_none());
    assert!(inventory.auto_backup().unwrap().is_none());
    assert_eq!(snapshot_names(inventory.layout()).len(), 1);
}

#[test]
fn test_mutation_triggers_next_backup() {
    let dir = TempDir::new().unwrap();
    let inventory = test_inventory(&dir);
    inventory.register_product(widget(), None).unwrap();
    inventory.auto_backup().unwrap().unwrap();

    // Let the store's mtime move past the snapshot's.
    std::thread::sleep(std::time::Duration::from_millis(50));
    inventory.apply(&"1001".into(), StockAction::Sale, 1).unwrap();

    assert!(inventory.auto_backup().unwrap().is_some());
}

#[test]
fn test_snapshot_bundles_the_fixed_file_set() {
    let dir = TempDir::new().unwrap();
    let inventory = test_inventory(&dir);
    inventory.register_product(widget(), None).unwrap();
    inventory.apply(&"1001".into(), StockAction::Sale, 1).unwrap();

    let path = inventory.auto_backup().unwrap().unwrap();
    let bytes = std::fs::read(path).unwrap();

    let mut archive = tar::Archive::new(GzDecoder::new(&bytes[..]));
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();

    assert!(names.contains(&"inventory.csv".to_string()));
    assert!(names.contains(&"history.csv".to_string()));
    assert!(names.contains(&"placeholder.png".to_string()));
    // Asset directories ride along at their relative locations.
    assert!(names.iter().any(|n| n.starts_with("product_images")));
    assert!(names.iter().any(|n| n.starts_with("qr_codes")));
    assert!(names.iter().any(|n| n.starts_with("barcodes")));
}

#[test]
fn test_retention_window_evicts_oldest_first() {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path().join("data"));
    layout.bootstrap().unwrap();
    let manager = BackupManager::new(layout.clone());

    for day in 1..=(BACKUP_RETENTION + 1) {
        let name = format!("backup_202602{day:02}_090000.tar.gz");
        std::fs::write(layout.backup_dir().join(name), b"snapshot").unwrap();
    }

    manager.prune().unwrap();

    let names = snapshot_names(&layout);
    assert_eq!(names.len(), BACKUP_RETENTION);
    assert_eq!(names.first().unwrap(), "backup_20260202_090000.tar.gz");
    assert!(!layout
        .backup_dir()
        .join("backup_20260201_090000.tar.gz")
        .exists());
}

#[test]
fn test_export_does_not_touch_retention() {
    let dir = TempDir::new().unwrap();
    let inventory = test_inventory(&dir);
    inventory.register_product(widget(), None).unwrap();

    let bytes = inventory.export_snapshot().unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    // On-demand export leaves the backup directory alone.
    assert!(snapshot_names(inventory.layout()).is_empty());

    // And the change-driven pass still fires afterwards.
    assert!(inventory.auto_backup().unwrap().is_some());
}

#[test]
fn test_startup_backup_runs_when_enabled() {
    let dir = TempDir::new().unwrap();
    {
        let inventory = test_inventory(&dir);
        inventory.register_product(widget(), None).unwrap();
    }

    // Reopen with the startup pass enabled: the changed store is captured.
    let config = InventoryConfig::new(dir.path().join("data"));
    let inventory = Inventory::open(config).unwrap();
    assert_eq!(snapshot_names(inventory.layout()).len(), 1);
}
