//! irdeck: console for the IR remote hub.
//! Single binary wiring the client, transport, and wizard pieces.

use clap::Parser;

use irdeck_api::{HubClient, HubConfig};

mod cli;
mod cmd_agents;
mod cmd_buttons;
mod cmd_learn;
mod cmd_pairing;
mod cmd_remotes;
mod cmd_send;
mod cmd_status;
mod context;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("IRDECK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = HubConfig::new(&args.url)?
        .with_api_key(args.api_key.clone())
        .with_write_requires_api_key(args.write_requires_api_key);
    let client = HubClient::new(config);

    match args.command {
        cli::Command::Remotes(command) => cmd_remotes::cmd_remotes(&client, command).await?,
        cli::Command::Buttons(command) => cmd_buttons::cmd_buttons(&client, command).await?,
        cli::Command::Send(opts) => cmd_send::cmd_send(&client, opts).await?,
        cli::Command::Agents(command) => cmd_agents::cmd_agents(&client, command).await?,
        cli::Command::Pairing(command) => cmd_pairing::cmd_pairing(&client, command).await?,
        cli::Command::Settings(command) => cmd_status::cmd_settings(&client, command).await?,
        cli::Command::Status(opts) => cmd_status::cmd_status(&client, opts).await?,
        cli::Command::Firmware => cmd_status::cmd_firmware(&client).await?,
        cli::Command::Health => cmd_status::cmd_health(&client).await?,
        cli::Command::Learn(opts) => {
            let exit_code = cmd_learn::cmd_learn(&client, opts).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
