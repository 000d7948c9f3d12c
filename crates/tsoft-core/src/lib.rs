//! Back-office services layered next to the upstream client.
//!
//! - **[`WarehouseLedger`]**: local per-warehouse stock bookkeeping keyed by
//!   barcode, with transfers and a sync from decoded upstream products.
//! - **[`LicenseRegistry`]**: license keys, validation, activation with
//!   machine binding, and statistics.
//! - **[`LicenseGate`]**: per-request license check for HTTP collaborators.
//!
//! Both services keep their records behind the [`Store`] trait;
//! [`MemoryStore`] is the process-lifetime implementation.

pub mod error;
pub mod license;
pub mod store;
pub mod warehouse;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use license::{
    Activation, DenyBody, GateDecision, License, LicenseGate, LicenseRegistry, LicenseStatistics,
    LicenseType, NewLicense, Validation,
};
pub use store::{MemoryStore, Record, Store};
pub use warehouse::{
    NewWarehouse, StockChange, StockLocation, SyncReport, Warehouse, WarehouseLedger, WarehouseStock,
    find_by_barcode,
};
