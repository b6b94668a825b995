//! Core types for the inventory ledger.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// On-disk timestamp format, shared by the store and the transaction log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique identifier for a product.
///
/// Always compares and indexes as a string, even when the persisted value
/// originated as a number. The same value is encoded into the product's
/// QR and barcode assets.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    /// Canonicalize a raw persisted value: trim whitespace and strip the
    /// `.0` suffix left behind when an id column round-trips through a
    /// spreadsheet as a float.
    pub fn canonical(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(prefix) = trimmed.strip_suffix(".0") {
            if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
                return ProductId(prefix.to_string());
            }
        }
        ProductId(trimmed.to_string())
    }

    /// Mint a random 8-digit id for a new registration.
    pub fn generate() -> Self {
        use rand::Rng;
        ProductId(rand::thread_rng().gen_range(10_000_000u32..100_000_000).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId(s.to_string())
    }
}

/// A stock-changing operation.
///
/// `Sale` and `Remove` have the same arithmetic effect; they are logged
/// distinctly so profit reporting can tell them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockAction {
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "REMOVE")]
    Remove,
    #[serde(rename = "SALE")]
    Sale,
}

impl StockAction {
    /// The label written to the transaction log.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockAction::Add => "ADD",
            StockAction::Remove => "REMOVE",
            StockAction::Sale => "SALE",
        }
    }

    /// Signed quantity delta for a requested magnitude.
    pub fn signed_delta(&self, amount: u32) -> i64 {
        match self {
            StockAction::Add => amount as i64,
            StockAction::Remove | StockAction::Sale => -(amount as i64),
        }
    }
}

impl fmt::Display for StockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row in the product table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,

    pub product_name: String,

    /// On-hand stock. Never observably negative; mutations clamp at zero.
    pub quantity: u32,

    /// Alert threshold: `quantity <= min_stock` flags the product as low.
    pub min_stock: u32,

    pub cost_price: Decimal,

    pub sell_price: Decimal,

    #[serde(with = "ts_format_opt")]
    pub last_updated: Option<NaiveDateTime>,

    /// Path to the product photo, or the shared placeholder after
    /// reconciliation. Empty only before the first reconciliation pass.
    pub image_path: Option<PathBuf>,

    pub qr_path: Option<PathBuf>,

    pub barcode_path: Option<PathBuf>,
}

/// Input for registering a new product (before the row is written).
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub min_stock: u32,
    pub cost_price: Decimal,
    pub sell_price: Decimal,
}

impl NewProduct {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity: 0,
            min_stock: 0,
            cost_price: Decimal::ZERO,
            sell_price: Decimal::ZERO,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_min_stock(mut self, min_stock: u32) -> Self {
        self.min_stock = min_stock;
        self
    }

    pub fn with_prices(mut self, cost: Decimal, sell: Decimal) -> Self {
        self.cost_price = cost;
        self.sell_price = sell;
        self
    }
}

/// Partial update applied to an existing product row.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub quantity: Option<u32>,
    pub min_stock: Option<u32>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
}

/// One row in the append-only transaction log.
///
/// `product_name` is a denormalized snapshot, not a live reference;
/// `amount` is the requested magnitude, not the clamped delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    #[serde(with = "ts_format")]
    pub timestamp: NaiveDateTime,
    pub product_id: ProductId,
    pub product_name: String,
    pub action: StockAction,
    pub amount: u32,
    pub new_total: u32,
}

/// Result of a stock mutation, returned to the caller.
///
/// `low_stock` is a pure signal for the UI to surface; raising it has no
/// side effects in the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationOutcome {
    pub new_quantity: u32,
    pub low_stock: bool,
}

/// Current local time, truncated to the on-disk second resolution.
pub(crate) fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Serde adapter for `NaiveDateTime` in the `%Y-%m-%d %H:%M:%S` format.
pub mod ts_format {
    use super::{NaiveDateTime, TIMESTAMP_FORMAT};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Like [`ts_format`], but tolerates an empty cell.
pub mod ts_format_opt {
    use super::{NaiveDateTime, TIMESTAMP_FORMAT};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.trim().is_empty() {
            return Ok(None);
        }
        // Dates written without a time component are still accepted.
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id() {
        assert_eq!(ProductId::canonical("1001").as_str(), "1001");
        assert_eq!(ProductId::canonical("  1001 ").as_str(), "1001");
        assert_eq!(ProductId::canonical("1001.0").as_str(), "1001");
        // Not a float artifact: keep as-is.
        assert_eq!(ProductId::canonical("SKU-9.0x").as_str(), "SKU-9.0x");
        assert_eq!(ProductId::canonical("abc.0").as_str(), "abc.0");
    }

    #[test]
    fn test_generated_id_shape() {
        let id = ProductId::generate();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(StockAction::Add.as_str(), "ADD");
        assert_eq!(StockAction::Remove.as_str(), "REMOVE");
        assert_eq!(StockAction::Sale.as_str(), "SALE");
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(StockAction::Add.signed_delta(4), 4);
        assert_eq!(StockAction::Remove.signed_delta(4), -4);
        assert_eq!(StockAction::Sale.signed_delta(4), -4);
    }

    #[test]
    fn test_new_product_builder() {
        let input = NewProduct::new("1001", "Widget")
            .with_quantity(10)
            .with_min_stock(2)
            .with_prices(Decimal::new(100, 2), Decimal::new(200, 2));

        assert_eq!(input.id.as_str(), "1001");
        assert_eq!(input.quantity, 10);
        assert_eq!(input.min_stock, 2);
        assert_eq!(input.sell_price, Decimal::new(200, 2));
    }
}
