//! `irdeck agents` — agent registry, runtime config, OTA, and logs.

use irdeck_api::HubClient;
use irdeck_api::models::{AgentRuntimeConfigUpdate, AgentUpdate};
use irdeck_transport::{ReconnectPolicy, StreamEvent, agent_log_stream};

use crate::cli::AgentsCmd;
use crate::context::ensure_writable;
use crate::render::{dash, format_epoch, print_json, row};

pub async fn cmd_agents(client: &HubClient, command: AgentsCmd) -> anyhow::Result<()> {
    match command {
        AgentsCmd::List => {
            let agents = client.agents().await?;
            if agents.is_empty() {
                println!("no agents registered (open a pairing window to add one)");
                return Ok(());
            }
            println!(
                "{}",
                row(&[("ID", 18), ("NAME", 22), ("TRANSPORT", 10), ("STATUS", 8), ("VERSION", 8)])
            );
            for agent in agents {
                println!(
                    "{}",
                    row(&[
                        (&agent.id, 18),
                        (&dash(agent.name.as_deref()), 22),
                        (&dash(agent.transport.as_deref()), 10),
                        (&dash(agent.status.as_deref()), 8),
                        (&dash(agent.sw_version.as_deref()), 8),
                    ])
                );
            }
        }
        AgentsCmd::Show { id } => {
            let agent = client.agent(&id).await?;
            println!("id:            {}", agent.id);
            println!("name:          {}", dash(agent.name.as_deref()));
            println!("transport:     {}", dash(agent.transport.as_deref()));
            println!("status:        {}", dash(agent.status.as_deref()));
            println!("version:       {}", dash(agent.sw_version.as_deref()));
            println!("config url:    {}", dash(agent.configuration_url.as_deref()));
            if !agent.capabilities.is_null() {
                println!("capabilities:  {}", agent.capabilities);
            }
        }
        AgentsCmd::Set {
            id,
            name,
            configuration_url,
        } => {
            ensure_writable(client)?;
            let update = AgentUpdate {
                name,
                configuration_url,
            };
            let agent = client.update_agent(&id, &update).await?;
            println!("updated agent {}", agent.id);
        }
        AgentsCmd::Debug { id, enabled } => {
            ensure_writable(client)?;
            client.set_agent_debug(&id, enabled).await?;
            println!(
                "debug logs {} for agent {id}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        AgentsCmd::Pins { id, rx, tx } => {
            ensure_writable(client)?;
            let update = AgentRuntimeConfigUpdate {
                ir_rx_pin: rx,
                ir_tx_pin: tx,
            };
            client.set_agent_runtime_config(&id, &update).await?;
            println!("runtime config updated for agent {id}");
        }
        AgentsCmd::Reboot { id } => {
            ensure_writable(client)?;
            client.reboot_agent(&id).await?;
            println!("reboot requested for agent {id}");
        }
        AgentsCmd::Ota { id, version } => {
            ensure_writable(client)?;
            let result = client.agent_ota(&id, version).await?;
            print_json(&result);
        }
        AgentsCmd::Logs { id, follow } => {
            print_stored_logs(client, &id).await?;
            if follow {
                follow_logs(client, &id).await?;
            }
        }
    }
    Ok(())
}

async fn print_stored_logs(client: &HubClient, agent_id: &str) -> anyhow::Result<()> {
    let logs = client.agent_logs(agent_id).await?;
    let Some(entries) = logs.as_array() else {
        print_json(&logs);
        return Ok(());
    };
    for entry in entries {
        print_log_line(entry);
    }
    Ok(())
}

/// Stream pushed log frames until Ctrl-C.
async fn follow_logs(client: &HubClient, agent_id: &str) -> anyhow::Result<()> {
    let url = client.config().ws_url(&format!("/agents/{agent_id}/logs/ws"));
    let (handle, mut rx) = agent_log_stream(url, ReconnectPolicy::default());

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(StreamEvent::Frame(entry)) => {
                    println!(
                        "{}  {:<5}  {}",
                        format_epoch(entry.timestamp),
                        entry.level.as_str(),
                        entry.message
                    );
                }
                Some(StreamEvent::Lapsed) => {
                    eprintln!("(log channel unavailable, retrying in the background)");
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.close();
    Ok(())
}

fn print_log_line(entry: &serde_json::Value) {
    let timestamp = entry
        .get("timestamp")
        .and_then(|v| v.as_f64())
        .map(format_epoch)
        .unwrap_or_else(|| "-".to_owned());
    let level = entry.get("level").and_then(|v| v.as_str()).unwrap_or("info");
    let message = entry.get("message").and_then(|v| v.as_str()).unwrap_or("");
    println!("{timestamp}  {level:<5}  {message}");
}
