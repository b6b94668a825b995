//! Product record store.
//!
//! The table is persisted as one CSV file with a canonical column set;
//! loading heals any drift in the persisted shape and repairs asset
//! links before the caller ever sees a record.

mod reconcile;
mod table;

pub use reconcile::{reconcile, AssetManifest, IMAGE_EXTENSIONS};
pub use table::{ProductTable, CANONICAL_COLUMNS};

use crate::error::Result;
use crate::layout::Layout;
use tracing::warn;

/// Load the product table: parse, heal the schema, reconcile asset links,
/// and persist any repairs so they survive a restart.
///
/// Failing to persist the repairs is not fatal — the in-memory table is
/// already healed, and a broken asset link must not block selling or
/// restocking.
pub fn open(layout: &Layout) -> Result<ProductTable> {
    let mut table = ProductTable::load(&layout.store_file())?;
    reconcile::reconcile(&mut table, layout);
    if table.is_dirty() {
        if let Err(e) = table.save(&layout.store_file()) {
            warn!(error = %e, "could not persist healed table; repairs stay in memory");
        }
    }
    Ok(table)
}
