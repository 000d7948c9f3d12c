//! Lookup list handlers: payment types, cargo companies, order statuses.

use serde::Serialize;
use tabled::Tabled;
use tsoft_api::{Envelope, Reference, TsoftClient};

use crate::cli::{GlobalOpts, ReferenceArgs, ReferenceCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReferenceRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Code")]
    code: String,
}

fn row(item: &impl Reference) -> ReferenceRow {
    ReferenceRow {
        id: item.reference_id().to_owned(),
        name: item.reference_name().to_owned(),
        code: item.reference_code().to_owned(),
    }
}

fn print<T: Reference + Serialize>(
    envelope: Envelope<Vec<T>>,
    operation: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let items = util::ensure(envelope, operation)?;
    let out = output::render_list(global.output, &items, row, |i| i.reference_id().to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(client: &TsoftClient, args: ReferenceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ReferenceCommand::PaymentTypes => print(client.payment_types().await, "payment type list", global),
        ReferenceCommand::CargoCompanies => print(client.cargo_companies().await, "cargo company list", global),
        ReferenceCommand::OrderStatuses => print(client.order_statuses().await, "order status list", global),
    }
}
