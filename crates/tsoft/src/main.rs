mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsoft_api::TsoftClient;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool) {
    let filter = filter_directive(verbosity, debug);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `--debug` payload logging is emitted at debug level by the API crate,
/// so it needs at least that level there whatever `-v` says.
fn filter_directive(verbosity: u8, debug: bool) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    if debug && verbosity < 2 {
        format!("{level},tsoft_api=debug")
    } else {
        level.to_owned()
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a shop connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "tsoft", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let client_config = config::build_client_config(&cli.global)?;
            let client = TsoftClient::new(&client_config).map_err(|source| CliError::ClientSetup {
                url: client_config.base_url.to_string(),
                source,
            })?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn debug_flag_opens_api_logging() {
        assert_eq!(filter_directive(0, false), "warn");
        assert_eq!(filter_directive(0, true), "warn,tsoft_api=debug");
        assert_eq!(filter_directive(1, true), "info,tsoft_api=debug");
        assert_eq!(filter_directive(3, true), "trace");
    }
}
