//! Performance benchmarks for the inventory ledger.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use stockledger::{Collaborators, Inventory, InventoryConfig, NewProduct, ProductId, StockAction};
use tempfile::TempDir;

fn create_inventory(dir: &TempDir) -> Inventory {
    let mut config = InventoryConfig::new(dir.path().join("data"));
    config.auto_backup_on_open = false;
    Inventory::open_with(config, Collaborators::default()).unwrap()
}

fn seed(inventory: &Inventory, products: usize) {
    for i in 0..products {
        inventory
            .register_product(
                NewProduct::new(format!("{}", 10_000_000 + i), format!("Product {i}"))
                    .with_quantity(100)
                    .with_min_stock(5)
                    .with_prices(Decimal::new(150, 2), Decimal::new(400, 2)),
                None,
            )
            .unwrap();
    }
}

/// Benchmark mutation cost as the table grows: every apply rewrites the
/// whole store, so this tracks the cost of the durability unit.
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for products in [10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("table_size", products),
            &products,
            |b, &products| {
                let dir = TempDir::new().unwrap();
                let inventory = create_inventory(&dir);
                seed(&inventory, products);
                let id = ProductId::new("10000000");

                b.iter(|| {
                    black_box(inventory.apply(&id, StockAction::Add, 1).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark cold open: parse, heal, and reconcile the full table.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open");

    for products in [100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("table_size", products),
            &products,
            |b, &products| {
                let dir = TempDir::new().unwrap();
                {
                    let inventory = create_inventory(&dir);
                    seed(&inventory, products);
                }
                let mut config = InventoryConfig::new(dir.path().join("data"));
                config.auto_backup_on_open = false;

                b.iter(|| {
                    black_box(Inventory::open(config.clone()).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark history projection over a long log.
fn bench_history(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let inventory = create_inventory(&dir);
    seed(&inventory, 1);
    let id = ProductId::new("10000000");
    for _ in 0..5_000 {
        inventory.apply(&id, StockAction::Sale, 1).unwrap();
    }

    c.bench_function("history_5k_entries", |b| {
        b.iter(|| {
            black_box(inventory.history().unwrap());
        });
    });
}

criterion_group!(benches, bench_apply, bench_open, bench_history);
criterion_main!(benches);
