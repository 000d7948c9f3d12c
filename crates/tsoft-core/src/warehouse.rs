// ── Warehouse ledger ──
//
// Local stock bookkeeping per warehouse, keyed by barcode. The upstream
// shop knows nothing about these warehouses; products only flow in through
// `sync_products`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tsoft_api::Product;

use crate::error::CoreError;
use crate::store::{MemoryStore, Record, Store};

/// Name reported for stock rows whose warehouse no longer exists.
const UNKNOWN_WAREHOUSE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for Warehouse {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Quantity of one barcode in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub id: u64,
    pub warehouse_id: u64,
    pub barcode: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Input for creating or updating a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
}

/// Result of booking stock into a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockChange {
    pub stock: WarehouseStock,
    /// `true` when a new stock row was opened.
    pub created: bool,
}

/// Where a barcode is stocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLocation {
    pub warehouse_name: String,
    pub quantity: i64,
}

/// Outcome of syncing upstream products into the default warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Warehouse and stock bookkeeping.
pub struct WarehouseLedger {
    warehouses: Arc<dyn Store<u64, Warehouse>>,
    stocks: Arc<dyn Store<u64, WarehouseStock>>,
    next_warehouse: AtomicU64,
    next_stock: AtomicU64,
    /// Serializes multi-step stock mutations (find-then-insert, transfers).
    writes: Mutex<()>,
}

impl WarehouseLedger {
    /// In-memory ledger seeded with the two default warehouses.
    pub fn new() -> Self {
        Self::with_stores(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Ledger over injected stores. Empty warehouse stores are seeded.
    pub fn with_stores(
        warehouses: Arc<dyn Store<u64, Warehouse>>,
        stocks: Arc<dyn Store<u64, WarehouseStock>>,
    ) -> Self {
        let next_warehouse = warehouses.list().iter().map(|w| w.id).max().unwrap_or(0) + 1;
        let next_stock = stocks.list().iter().map(|s| s.id).max().unwrap_or(0) + 1;

        let ledger = Self {
            warehouses,
            stocks,
            next_warehouse: AtomicU64::new(next_warehouse),
            next_stock: AtomicU64::new(next_stock),
            writes: Mutex::new(()),
        };

        if ledger.warehouses.is_empty() {
            for (code, name, location) in [
                ("DEPO-01", "Ana Depo", "İstanbul"),
                ("DEPO-02", "Yedek Depo", "Ankara"),
            ] {
                ledger.insert_warehouse(NewWarehouse {
                    code: code.into(),
                    name: name.into(),
                    location: location.into(),
                });
            }
        }
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Warehouses ───────────────────────────────────────────────────

    /// Active warehouses, by id.
    pub fn warehouses(&self) -> Vec<Warehouse> {
        self.warehouses
            .list()
            .into_iter()
            .filter(Warehouse::is_active)
            .collect()
    }

    /// Any warehouse by id, retired ones included.
    pub fn warehouse(&self, id: u64) -> Option<Warehouse> {
        self.warehouses.get(&id)
    }

    /// Where synced products land: the lowest-id active warehouse.
    pub fn default_warehouse(&self) -> Option<Warehouse> {
        self.warehouses().into_iter().next()
    }

    pub fn create_warehouse(&self, input: NewWarehouse) -> Result<Warehouse, CoreError> {
        validate_warehouse(&input)?;
        let warehouse = self.insert_warehouse(input);
        info!(code = %warehouse.code, name = %warehouse.name, "warehouse created");
        Ok(warehouse)
    }

    fn insert_warehouse(&self, input: NewWarehouse) -> Warehouse {
        let warehouse = Warehouse {
            id: self.next_warehouse.fetch_add(1, Ordering::Relaxed),
            code: input.code,
            name: input.name,
            location: input.location,
            is_active: true,
            created_at: Utc::now(),
        };
        self.warehouses.upsert(warehouse.id, warehouse.clone());
        warehouse
    }

    /// Replace code, name and location.
    pub fn update_warehouse(&self, id: u64, input: NewWarehouse) -> Result<Warehouse, CoreError> {
        validate_warehouse(&input)?;
        let updated = self
            .warehouses
            .modify(&id, &mut |w: &mut Warehouse| {
                w.code.clone_from(&input.code);
                w.name.clone_from(&input.name);
                w.location.clone_from(&input.location);
            })
            .ok_or(CoreError::WarehouseNotFound { id })?;
        info!(code = %updated.code, name = %updated.name, "warehouse updated");
        Ok(updated)
    }

    /// Retire a warehouse. Its stock rows are kept.
    pub fn delete_warehouse(&self, id: u64) -> Result<(), CoreError> {
        if !self.warehouses.soft_delete(&id) {
            return Err(CoreError::WarehouseNotFound { id });
        }
        info!(id, "warehouse retired");
        Ok(())
    }

    // ── Stock ────────────────────────────────────────────────────────

    /// Stock rows of one warehouse.
    pub fn stocks(&self, warehouse_id: u64) -> Vec<WarehouseStock> {
        self.stocks
            .list()
            .into_iter()
            .filter(|s| s.warehouse_id == warehouse_id)
            .collect()
    }

    /// Every stock row.
    pub fn all_stocks(&self) -> Vec<WarehouseStock> {
        self.stocks.list()
    }

    fn find_stock(&self, warehouse_id: u64, barcode: &str) -> Option<WarehouseStock> {
        self.stocks
            .list()
            .into_iter()
            .find(|s| s.warehouse_id == warehouse_id && s.barcode == barcode)
    }

    /// Book `quantity` of `barcode` into a warehouse. Counts accumulate on
    /// an existing row; otherwise a new row is opened.
    pub fn add_stock(&self, warehouse_id: u64, barcode: &str, quantity: i64) -> Result<StockChange, CoreError> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(CoreError::validation("barcode is required"));
        }
        let warehouse = self
            .warehouse(warehouse_id)
            .ok_or(CoreError::WarehouseNotFound { id: warehouse_id })?;

        let _guard = self.lock();
        let change = self.book(warehouse_id, barcode, quantity);
        info!(
            barcode,
            quantity,
            total = change.stock.quantity,
            warehouse = %warehouse.name,
            created = change.created,
            "stock booked"
        );
        Ok(change)
    }

    /// Add to an existing row or open one. Caller holds the write lock.
    fn book(&self, warehouse_id: u64, barcode: &str, quantity: i64) -> StockChange {
        let now = Utc::now();
        if let Some(existing) = self.find_stock(warehouse_id, barcode) {
            let stock = self
                .stocks
                .modify(&existing.id, &mut |s: &mut WarehouseStock| {
                    s.quantity += quantity;
                    s.last_updated = now;
                })
                .unwrap_or(existing);
            return StockChange {
                stock,
                created: false,
            };
        }

        let stock = WarehouseStock {
            id: self.next_stock.fetch_add(1, Ordering::Relaxed),
            warehouse_id,
            barcode: barcode.to_owned(),
            quantity,
            created_at: now,
            last_updated: now,
        };
        self.stocks.upsert(stock.id, stock.clone());
        StockChange {
            stock,
            created: true,
        }
    }

    /// Move stock between warehouses. The destination row is opened on
    /// demand.
    pub fn transfer(&self, from: u64, to: u64, barcode: &str, quantity: i64) -> Result<(), CoreError> {
        if quantity <= 0 {
            return Err(CoreError::validation("transfer quantity must be positive"));
        }
        if from == to {
            return Err(CoreError::validation("source and destination are the same warehouse"));
        }
        let source = self.warehouse(from).ok_or(CoreError::WarehouseNotFound { id: from })?;
        let target = self.warehouse(to).ok_or(CoreError::WarehouseNotFound { id: to })?;

        let _guard = self.lock();
        let available = self.find_stock(from, barcode).map_or(0, |s| s.quantity);
        if available < quantity {
            warn!(barcode, available, requested = quantity, "transfer rejected");
            return Err(CoreError::InsufficientStock {
                barcode: barcode.to_owned(),
                available,
                requested: quantity,
            });
        }

        self.book(from, barcode, -quantity);
        self.book(to, barcode, quantity);

        info!(
            barcode,
            quantity,
            from = %source.name,
            to = %target.name,
            "stock transferred"
        );
        Ok(())
    }

    /// Quantities of a barcode in every warehouse that stocks it.
    pub fn stock_locations(&self, barcode: &str) -> Vec<StockLocation> {
        self.stocks
            .list()
            .into_iter()
            .filter(|s| s.barcode == barcode)
            .map(|s| StockLocation {
                warehouse_name: self
                    .warehouse(s.warehouse_id)
                    .map_or_else(|| UNKNOWN_WAREHOUSE.to_owned(), |w| w.name),
                quantity: s.quantity,
            })
            .collect()
    }

    /// Set the default warehouse's stock for each product to the
    /// upstream stock figure.
    ///
    /// Products without a barcode cannot be tracked and are reported as
    /// failures.
    pub fn sync_products(&self, products: &[Product]) -> Result<SyncReport, CoreError> {
        let warehouse = self
            .default_warehouse()
            .ok_or_else(|| CoreError::validation("no active warehouse to sync into"))?;

        let mut report = SyncReport::default();
        let _guard = self.lock();
        for product in products {
            let Some(barcode) = product.barcode.as_deref().map(str::trim).filter(|b| !b.is_empty()) else {
                report.failed += 1;
                report.errors.push(format!(
                    "{}: missing barcode",
                    product.product_code.non_empty().unwrap_or("(no code)")
                ));
                continue;
            };

            let quantity = product.stock.as_i64().unwrap_or(0);
            let current = self.find_stock(warehouse.id, barcode).map_or(0, |s| s.quantity);
            self.book(warehouse.id, barcode, quantity - current);
            report.succeeded += 1;
        }

        info!(
            warehouse = %warehouse.name,
            succeeded = report.succeeded,
            failed = report.failed,
            "products synced"
        );
        Ok(report)
    }
}

impl Default for WarehouseLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// First product whose barcode matches exactly.
pub fn find_by_barcode<'a>(products: &'a [Product], barcode: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.barcode.as_deref() == Some(barcode))
}

fn validate_warehouse(input: &NewWarehouse) -> Result<(), CoreError> {
    if input.code.trim().is_empty() {
        return Err(CoreError::validation("warehouse code is required"));
    }
    if input.name.trim().is_empty() {
        return Err(CoreError::validation("warehouse name is required"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use tsoft_api::Scalar;

    use super::*;

    #[test]
    fn seeded_with_two_warehouses() {
        let ledger = WarehouseLedger::new();
        let codes: Vec<_> = ledger.warehouses().into_iter().map(|w| w.code).collect();
        assert_eq!(codes, ["DEPO-01", "DEPO-02"]);
        assert_eq!(ledger.default_warehouse().unwrap().id, 1);
    }

    #[test]
    fn adding_stock_accumulates() {
        let ledger = WarehouseLedger::new();

        let first = ledger.add_stock(1, "869000", 5).unwrap();
        let second = ledger.add_stock(1, "869000", 3).unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.stock.quantity, 8);
        assert_eq!(ledger.stocks(1).len(), 1);
    }

    #[test]
    fn unknown_warehouse_is_rejected() {
        let ledger = WarehouseLedger::new();
        assert_eq!(
            ledger.add_stock(99, "869000", 1),
            Err(CoreError::WarehouseNotFound { id: 99 })
        );
    }

    #[test]
    fn transfer_moves_stock_and_opens_destination() {
        let ledger = WarehouseLedger::new();
        ledger.add_stock(1, "869000", 10).unwrap();

        ledger.transfer(1, 2, "869000", 4).unwrap();

        let locations = ledger.stock_locations("869000");
        assert_eq!(
            locations,
            [
                StockLocation {
                    warehouse_name: "Ana Depo".into(),
                    quantity: 6
                },
                StockLocation {
                    warehouse_name: "Yedek Depo".into(),
                    quantity: 4
                },
            ]
        );
    }

    #[test]
    fn transfer_beyond_available_is_rejected() {
        let ledger = WarehouseLedger::new();
        ledger.add_stock(1, "869000", 2).unwrap();

        let err = ledger.transfer(1, 2, "869000", 3).unwrap_err();

        assert_eq!(
            err,
            CoreError::InsufficientStock {
                barcode: "869000".into(),
                available: 2,
                requested: 3
            }
        );
        assert!(ledger.stocks(2).is_empty());
    }

    #[test]
    fn retired_warehouse_is_hidden_but_reachable() {
        let ledger = WarehouseLedger::new();
        ledger.delete_warehouse(1).unwrap();

        assert_eq!(ledger.warehouses().len(), 1);
        assert!(!ledger.warehouse(1).unwrap().is_active);
        assert_eq!(ledger.default_warehouse().unwrap().code, "DEPO-02");
    }

    #[test]
    fn sync_sets_default_warehouse_stock() {
        let ledger = WarehouseLedger::new();
        ledger.add_stock(1, "111", 50).unwrap();

        let products = [
            Product {
                product_code: Scalar::from("P1"),
                barcode: Scalar::from("111"),
                stock: Scalar::from("7"),
                ..Product::default()
            },
            Product {
                product_code: Scalar::from("P2"),
                ..Product::default()
            },
        ];

        let report = ledger.sync_products(&products).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors, ["P2: missing barcode"]);
        assert_eq!(ledger.stocks(1)[0].quantity, 7);
        assert_eq!(find_by_barcode(&products, "111").unwrap().product_code.as_str(), "P1");
    }
}
