//! # Stockledger
//!
//! A file-backed inventory ledger for a single business location:
//! product records, their linked visual/scan assets, and an append-only
//! history of stock-changing events.
//!
//! ## Core Concepts
//!
//! - **Store**: the canonical product table, persisted as CSV with
//!   schema self-healing on load
//! - **Reconciliation**: the repair pass re-linking records to on-disk
//!   assets at their canonical per-id locations
//! - **Ledger**: the append-only transaction log, one immutable row per
//!   stock mutation
//! - **Backups**: change-driven, rotated snapshots of the store, log,
//!   and asset directories
//!
//! ## Example
//!
//! ```ignore
//! use stockledger::{Inventory, InventoryConfig, NewProduct, StockAction};
//! use rust_decimal::Decimal;
//!
//! let inventory = Inventory::open(InventoryConfig::new("./data"))?;
//!
//! inventory.register_product(
//!     NewProduct::new("1001", "Widget")
//!         .with_quantity(10)
//!         .with_min_stock(2)
//!         .with_prices(Decimal::new(100, 2), Decimal::new(200, 2)),
//!     None,
//! )?;
//!
//! let outcome = inventory.apply(&"1001".into(), StockAction::Sale, 3)?;
//! assert_eq!(outcome.new_quantity, 7);
//! ```

pub mod assets;
pub mod backup;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod license;
pub mod reports;
pub mod service;
pub mod store;
pub mod types;

// Re-exports
pub use assets::{AssetGenerator, ImageNormalizer};
pub use backup::{BackupManager, BACKUP_RETENTION};
pub use error::{LedgerError, Result};
pub use layout::{AppConfig, Layout};
pub use ledger::TransactionLog;
pub use license::{HttpLicenseOracle, LicenseOracle, LicenseStatus};
pub use reports::{ProfitReport, StockSummary};
pub use service::{Collaborators, Inventory, InventoryConfig};
pub use store::{AssetManifest, ProductTable, CANONICAL_COLUMNS, IMAGE_EXTENSIONS};
pub use types::*;
