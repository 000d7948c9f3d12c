//! Order command handlers.

use tabled::Tabled;
use tsoft_api::{Order, OrderDetail, TsoftClient, order_page_filters};

use crate::cli::{GlobalOpts, OrdersArgs, OrdersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Items")]
    items: String,
    #[tabled(rename = "City")]
    city: String,
}

fn order_row(o: &Order, enriched: bool) -> OrderRow {
    let status = o
        .order_status
        .non_empty()
        .or_else(|| o.status.non_empty())
        .unwrap_or_default();
    let city = o
        .city
        .non_empty()
        .or_else(|| o.shipping_city.non_empty())
        .unwrap_or_default();
    OrderRow {
        id: o.order_id.to_string(),
        code: o.order_code.to_string(),
        customer: o.customer_name.to_string(),
        status: status.to_owned(),
        total: o.display_total().to_owned(),
        items: if enriched { o.item_count.to_string() } else { String::new() },
        city: city.to_owned(),
    }
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Product")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Supply")]
    supply: String,
}

impl From<&OrderDetail> for LineRow {
    fn from(d: &OrderDetail) -> Self {
        Self {
            code: d.product_code.to_string(),
            name: d.product_name.to_string(),
            quantity: d.quantity.to_string(),
            price: d.price.to_string(),
            total: d.total.to_string(),
            supply: d.supply_status.to_string(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &TsoftClient, args: OrdersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        OrdersCommand::List { list, enrich } => {
            let mut filters = order_page_filters(list.page, list.limit);
            filters.extend(util::parse_pairs(&list.filter, "filter")?);

            let mut orders = util::ensure(client.list_orders(list.limit, &filters).await, "order list")?;
            if enrich {
                let report = client.enrich_orders(&mut orders).await;
                tracing::debug!(
                    outcome = ?report.outcome,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "order enrichment finished"
                );
                if let Some(warning) = report.warning() {
                    output::status(warning, false, color, global.quiet);
                }
            }

            let out = output::render_list(
                global.output,
                &orders,
                |o| order_row(o, enrich),
                |o| o.order_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Details { order } => {
            let envelope = match order.trim().parse::<i64>() {
                Ok(id) => client.order_details_by_id(id).await,
                Err(_) => client.order_details_by_code(order.trim()).await,
            };
            let lines = envelope.into_result().map_err(|_| CliError::NotFound {
                resource_type: "order".into(),
                identifier: order.clone(),
            })?;
            let out = output::render_list(
                global.output,
                &lines,
                |d| LineRow::from(d),
                |d| d.product_code.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
