//! Customer command handlers.

use tabled::Tabled;
use tsoft_api::{Customer, TsoftClient};

use crate::cli::{CustomersArgs, CustomersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "City")]
    city: String,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.customer_id.to_string(),
            code: c.customer_code.to_string(),
            name: c.customer_name.to_string(),
            email: c.email.to_string(),
            phone: c.phone.to_string(),
            city: c.city.to_string(),
        }
    }
}

fn customer_detail(c: &Customer) -> String {
    output::detail(&[
        ("Id", c.customer_id.as_str()),
        ("Code", c.customer_code.as_str()),
        ("Name", c.customer_name.as_str()),
        ("Email", c.email.as_str()),
        ("Phone", c.phone.as_str()),
        ("Group", c.customer_group.as_str()),
        ("City", c.city.as_str()),
        ("Country", c.country.as_str()),
        ("Address", c.address.as_str()),
        ("Active", c.is_active.as_str()),
        ("Created", c.created_date.as_str()),
    ])
}

pub async fn handle(client: &TsoftClient, args: CustomersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CustomersCommand::List(list) => {
            let mut filters = util::parse_pairs(&list.filter, "filter")?;
            if list.page > 1 {
                filters.entry("page".into()).or_insert_with(|| list.page.to_string());
            }
            let customers = util::ensure(client.list_customers(list.limit, &filters).await, "customer list")?;
            let out = output::render_list(
                global.output,
                &customers,
                |c| CustomerRow::from(c),
                |c| c.customer_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Get { id } => {
            let customer = client.customer_by_id(id).await.into_result().map_err(|_| CliError::NotFound {
                resource_type: "customer".into(),
                identifier: id.to_string(),
            })?;
            let out = output::render_single(global.output, &customer, customer_detail, |c| {
                c.customer_id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
