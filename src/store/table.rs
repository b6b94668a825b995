//! Canonical product table with schema self-healing.

use crate::error::{LedgerError, Result};
use crate::types::{ProductId, ProductRecord, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// The canonical column set, in persisted order.
///
/// Must match the field order of [`ProductRecord`]; `save` relies on that.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "product_id",
    "product_name",
    "quantity",
    "min_stock",
    "cost_price",
    "sell_price",
    "last_updated",
    "image_path",
    "qr_path",
    "barcode_path",
];

/// In-memory product table, indexed by id.
///
/// Loading always yields exactly the canonical column set: columns missing
/// from the persisted file are seeded with defaults and the table is marked
/// dirty so the healed shape is persisted. Saving serializes the whole
/// table; there is no row-level persistence.
pub struct ProductTable {
    records: Vec<ProductRecord>,
    index: HashMap<ProductId, usize>,
    dirty: bool,
}

impl ProductTable {
    /// Load the table from `path`, creating and persisting an empty one if
    /// no file exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut table = Self::empty();
            table.save(path)?;
            return Ok(table);
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        // One-shot column migration: anything outside the canonical set is
        // dropped, anything missing is seeded below.
        let positions: Vec<Option<usize>> = CANONICAL_COLUMNS
            .iter()
            .map(|name| headers.iter().position(|h| h == name))
            .collect();
        let mut dirty = positions.iter().any(Option::is_none)
            || headers.len() != CANONICAL_COLUMNS.len();
        if dirty {
            debug!(path = %path.display(), "store columns migrated to canonical set");
        }

        let mut table = Self::empty();
        for row in reader.records() {
            let row = row?;
            let cell = |i: usize| -> &str {
                positions[i].and_then(|p| row.get(p)).unwrap_or("").trim()
            };

            let raw_id = cell(0);
            let product_id = ProductId::canonical(raw_id);
            if product_id.as_str() != raw_id {
                dirty = true;
            }

            let record = ProductRecord {
                product_id,
                product_name: cell(1).to_string(),
                quantity: parse_count(cell(2), &mut dirty),
                min_stock: parse_count(cell(3), &mut dirty),
                cost_price: parse_money(cell(4), &mut dirty),
                sell_price: parse_money(cell(5), &mut dirty),
                last_updated: parse_timestamp(cell(6), &mut dirty),
                image_path: parse_path(cell(7)),
                qr_path: parse_path(cell(8)),
                barcode_path: parse_path(cell(9)),
            };

            // A damaged file can carry the same id twice; the first row
            // wins and the healed table is persisted without the rest.
            if table.contains(&record.product_id) {
                warn!(id = %record.product_id, "dropping duplicate row during load");
                dirty = true;
                continue;
            }
            table.insert(record)?;
        }

        table.dirty = dirty;
        Ok(table)
    }

    fn empty() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            dirty: false,
        }
    }

    /// Serialize the full table back to `path`.
    ///
    /// This is the unit of durability: the new content is written to a
    /// sibling temp file and renamed over the old one.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(CANONICAL_COLUMNS)?;
            for record in &self.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ProductId) -> Option<&ProductRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, id: &ProductId) -> Option<&mut ProductRecord> {
        self.index.get(id).map(|&i| &mut self.records[i])
    }

    /// Insert a new row. Duplicate ids are rejected before any write.
    pub fn insert(&mut self, record: ProductRecord) -> Result<()> {
        if self.index.contains_key(&record.product_id) {
            return Err(LedgerError::Validation(format!(
                "product id already exists: {}",
                record.product_id
            )));
        }
        self.index
            .insert(record.product_id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Remove a row, preserving the order of the remaining records.
    pub fn remove(&mut self, id: &ProductId) -> Option<ProductRecord> {
        let pos = self.index.remove(id)?;
        let record = self.records.remove(pos);
        for (i, r) in self.records.iter().enumerate().skip(pos) {
            self.index.insert(r.product_id.clone(), i);
        }
        Some(record)
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProductRecord> {
        self.records.iter_mut()
    }
}

/// Lenient count parsing: accepts bare integers and float-formatted values
/// (`"10.0"`); anything else defaults to zero and flags the table dirty.
fn parse_count(raw: &str, dirty: &mut bool) -> u32 {
    if let Ok(n) = raw.parse::<u32>() {
        return n;
    }
    *dirty = true;
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u32)
        .unwrap_or(0)
}

fn parse_money(raw: &str, dirty: &mut bool) -> Decimal {
    if let Ok(d) = Decimal::from_str(raw) {
        return d;
    }
    *dirty = true;
    Decimal::ZERO
}

fn parse_timestamp(raw: &str, dirty: &mut bool) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(ts);
    }
    // Older rows carry a bare date.
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        *dirty = true;
        return date.and_hms_opt(0, 0, 0);
    }
    *dirty = true;
    None
}

fn parse_path(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        None
    } else {
        Some(PathBuf::from(raw))
    }
}
