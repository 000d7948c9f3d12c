//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod categories;
pub mod config_cmd;
pub mod customers;
pub mod orders;
pub mod products;
pub mod reference;
pub mod util;
pub mod warehouse;

use tsoft_api::TsoftClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a shop-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, client: &TsoftClient, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Products(args) => products::handle(client, args, global).await,
        Command::Categories(args) => categories::handle(client, args, global).await,
        Command::Customers(args) => customers::handle(client, args, global).await,
        Command::Orders(args) => orders::handle(client, args, global).await,
        Command::Reference(args) => reference::handle(client, args, global).await,
        Command::Warehouse(args) => warehouse::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
