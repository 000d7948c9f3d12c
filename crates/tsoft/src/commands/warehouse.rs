//! Warehouse command handlers.
//!
//! The ledger lives for one process, so each command first books a page
//! of upstream products into the default warehouse.

use tabled::Tabled;
use tsoft_api::{Product, ProductQuery, TsoftClient};
use tsoft_core::{StockLocation, WarehouseLedger, WarehouseStock, find_by_barcode};

use crate::cli::{GlobalOpts, ListArgs, WarehouseArgs, WarehouseCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StockRow {
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Barcode")]
    barcode: String,
    #[tabled(rename = "Quantity")]
    quantity: i64,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Quantity")]
    quantity: i64,
}

impl From<&StockLocation> for LocationRow {
    fn from(l: &StockLocation) -> Self {
        Self {
            warehouse: l.warehouse_name.clone(),
            quantity: l.quantity,
        }
    }
}

/// Fetch one product page and book it into a fresh ledger.
async fn synced_ledger(
    client: &TsoftClient,
    list: &ListArgs,
    global: &GlobalOpts,
) -> Result<(WarehouseLedger, Vec<Product>), CliError> {
    let query = ProductQuery {
        filters: util::parse_pairs(&list.filter, "filter")?,
        ..ProductQuery::page(list.limit, list.page)
    };
    let products = util::ensure(client.list_products(&query).await, "product list")?;

    let ledger = WarehouseLedger::new();
    let report = ledger.sync_products(&products)?;

    let color = output::should_color(global.color);
    output::status(
        &format!("{} products synced, {} skipped", report.succeeded, report.failed),
        report.failed == 0,
        color,
        global.quiet,
    );
    for error in &report.errors {
        output::status(error, false, color, global.quiet);
    }
    Ok((ledger, products))
}

pub async fn handle(client: &TsoftClient, args: WarehouseArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        WarehouseCommand::Sync(list) => {
            let (ledger, _) = synced_ledger(client, &list, global).await?;
            let stocks = ledger.all_stocks();
            let name_of = |stock: &WarehouseStock| {
                ledger
                    .warehouse(stock.warehouse_id)
                    .map_or_else(|| stock.warehouse_id.to_string(), |w| w.name)
            };
            let out = output::render_list(
                global.output,
                &stocks,
                |s| StockRow {
                    warehouse: name_of(s),
                    barcode: s.barcode.clone(),
                    quantity: s.quantity,
                    updated: s.last_updated.format("%Y-%m-%d %H:%M").to_string(),
                },
                |s| s.barcode.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WarehouseCommand::Locate { barcode, list } => {
            let (ledger, products) = synced_ledger(client, &list, global).await?;
            let locations = ledger.stock_locations(&barcode);
            if locations.is_empty() {
                return Err(CliError::NotFound {
                    resource_type: "barcode".into(),
                    identifier: barcode,
                });
            }
            if let Some(product) = find_by_barcode(&products, &barcode) {
                output::status(
                    &format!("{barcode} is {} ({})", product.product_code, product.product_name),
                    true,
                    output::should_color(global.color),
                    global.quiet,
                );
            }
            let out = output::render_list(
                global.output,
                &locations,
                |l| LocationRow::from(l),
                |l| l.warehouse_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
