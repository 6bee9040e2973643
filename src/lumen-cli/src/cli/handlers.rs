//! Command handlers for the CLI.

use anyhow::Result;

use super::args::{Cli, Commands};
use crate::host::Host;

/// Build the host from global flags and run the selected subcommand.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let host = Host::new(cli.channel, cli.config.as_deref(), cli.unsupported)?;

    match cli.command {
        Commands::Stream(stream_cli) => stream_cli.run(host).await,
        Commands::Simulate(simulate_cli) => simulate_cli.run(host).await,
        Commands::Rpc(rpc_cli) => rpc_cli.run(host).await,
    }
}
