//! `irdeck remotes` — remote CRUD.

use irdeck_api::HubClient;
use irdeck_api::models::RemoteUpdate;

use crate::cli::RemotesCmd;
use crate::context::ensure_writable;
use crate::render::{dash, row};

pub async fn cmd_remotes(client: &HubClient, command: RemotesCmd) -> anyhow::Result<()> {
    match command {
        RemotesCmd::List => {
            let remotes = client.remotes().await?;
            if remotes.is_empty() {
                println!("no remotes registered");
                return Ok(());
            }
            println!("{}", row(&[("ID", 6), ("NAME", 24), ("AGENT", 20), ("CARRIER", 8)]));
            for remote in remotes {
                println!(
                    "{}",
                    row(&[
                        (&remote.id.to_string(), 6),
                        (&remote.name, 24),
                        (&dash(remote.assigned_agent_id.as_deref()), 20),
                        (&dash(remote.carrier_hz), 8),
                    ])
                );
            }
        }
        RemotesCmd::Add { name } => {
            ensure_writable(client)?;
            let remote = client.create_remote(&name).await?;
            println!("created remote {} ({})", remote.name, remote.id);
        }
        RemotesCmd::Set {
            id,
            name,
            carrier_hz,
            duty_cycle,
            icon,
            agent_id,
        } => {
            ensure_writable(client)?;
            let update = RemoteUpdate {
                name,
                carrier_hz,
                duty_cycle,
                icon,
                assigned_agent_id: agent_id,
            };
            let remote = client.update_remote(id, &update).await?;
            println!("updated remote {} ({})", remote.name, remote.id);
        }
        RemotesCmd::Rm { id } => {
            ensure_writable(client)?;
            client.delete_remote(id).await?;
            println!("deleted remote {id}");
        }
    }
    Ok(())
}
