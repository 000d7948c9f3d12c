#![allow(clippy::unwrap_used)]
// Cross-service tests: decoded upstream products flowing into the ledger,
// and the gate reading a shared registry.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tsoft_api::{Product, decode};
use tsoft_core::{
    CoreError, GateDecision, LicenseGate, LicenseRegistry, LicenseType, MemoryStore, NewLicense, NewWarehouse,
    Store, Warehouse, WarehouseLedger, find_by_barcode,
};

#[test]
fn decoded_products_sync_into_default_warehouse() {
    let env = decode::<Vec<Product>>(
        r#"{"success":true,"data":[
            {"ProductCode":"P1","Barcode":"8690001","Stock":"12"},
            {"ProductCode":"P2","Barcode":8690002,"Stock":3.0},
            {"ProductCode":"P3"}
        ]}"#,
    );
    let products = env.data.unwrap();
    let ledger = WarehouseLedger::new();

    let report = ledger.sync_products(&products).unwrap();
    assert_eq!((report.succeeded, report.failed), (2, 1));

    let quantities: Vec<_> = ledger.stocks(1).into_iter().map(|s| (s.barcode, s.quantity)).collect();
    assert_eq!(quantities, [("8690001".to_owned(), 12), ("8690002".to_owned(), 3)]);

    // A second sync overwrites rather than accumulates.
    ledger.sync_products(&products).unwrap();
    assert_eq!(ledger.stocks(1)[0].quantity, 12);

    let found = find_by_barcode(&products, "8690002").unwrap();
    assert_eq!(found.product_code.as_str(), "P2");
}

#[test]
fn ledger_over_injected_store_keeps_existing_warehouses() {
    let store: Arc<MemoryStore<u64, Warehouse>> = Arc::new(MemoryStore::new());
    let first = WarehouseLedger::with_stores(store.clone(), Arc::new(MemoryStore::new()));
    let created = first
        .create_warehouse(NewWarehouse {
            code: "DEPO-03".into(),
            name: "Izmir".into(),
            location: "Izmir".into(),
        })
        .unwrap();
    assert_eq!(created.id, 3);

    // Reopening over the same store neither reseeds nor reuses ids.
    let second = WarehouseLedger::with_stores(store.clone(), Arc::new(MemoryStore::new()));
    assert_eq!(store.len(), 3);
    let next = second
        .create_warehouse(NewWarehouse {
            code: "DEPO-04".into(),
            name: "Bursa".into(),
            ..NewWarehouse::default()
        })
        .unwrap();
    assert_eq!(next.id, 4);

    assert!(matches!(
        second.create_warehouse(NewWarehouse::default()),
        Err(CoreError::Validation { .. })
    ));
}

#[test]
fn gate_follows_registry_changes() {
    let registry = Arc::new(LicenseRegistry::new());
    let gate = LicenseGate::new(Arc::clone(&registry));

    let trial = registry.active_license().unwrap();
    registry.revoke(&trial.license_key).unwrap();
    assert!(matches!(gate.check("/api/products"), GateDecision::Deny { api: true, .. }));

    registry
        .create(NewLicense::new("Acme", "ops@acme.test", LicenseType::Lifetime))
        .unwrap();
    assert_eq!(gate.check("/api/products"), GateDecision::Allow { warning: None });
}
