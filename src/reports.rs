//! Read-only projections for the reporting collaborators.
//!
//! Nothing here touches the mutation path; reports are computed from a
//! snapshot of the table and the full transaction history.

use crate::types::{ProductId, ProductRecord, StockAction, TransactionEntry};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Aggregate stock position across the whole table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StockSummary {
    pub item_count: usize,
    pub total_units: u64,
    /// Units on hand valued at cost.
    pub stock_value: Decimal,
    /// Units on hand valued at sell price.
    pub potential_sales: Decimal,
}

impl StockSummary {
    pub fn margin(&self) -> Decimal {
        self.potential_sales - self.stock_value
    }
}

pub fn summarize(records: &[ProductRecord]) -> StockSummary {
    let mut summary = StockSummary {
        item_count: records.len(),
        ..Default::default()
    };
    for record in records {
        let units = Decimal::from(record.quantity);
        summary.total_units += record.quantity as u64;
        summary.stock_value += units * record.cost_price;
        summary.potential_sales += units * record.sell_price;
    }
    summary
}

/// Realized profit over a period, from SALE entries joined with current
/// prices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfitReport {
    pub profit: Decimal,
    pub units_sold: u64,
    pub sale_count: usize,
}

/// Sum profit for SALE entries at or after `since` (all history when
/// `None`). Entries for products no longer in the table are skipped:
/// without a price row there is nothing to value them against.
pub fn profit_over(
    entries: &[TransactionEntry],
    records: &[ProductRecord],
    since: Option<NaiveDateTime>,
) -> ProfitReport {
    let prices: HashMap<&ProductId, (Decimal, Decimal)> = records
        .iter()
        .map(|r| (&r.product_id, (r.cost_price, r.sell_price)))
        .collect();

    let mut report = ProfitReport::default();
    for entry in entries {
        if entry.action != StockAction::Sale {
            continue;
        }
        if let Some(cutoff) = since {
            if entry.timestamp < cutoff {
                continue;
            }
        }
        let Some(&(cost, sell)) = prices.get(&entry.product_id) else {
            continue;
        };
        report.profit += (sell - cost) * Decimal::from(entry.amount);
        report.units_sold += entry.amount as u64;
        report.sale_count += 1;
    }
    report
}
