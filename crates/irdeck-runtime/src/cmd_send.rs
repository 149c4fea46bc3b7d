//! `irdeck send` — fire a button's press or hold waveform.

use irdeck_api::HubClient;
use irdeck_api::models::SendRequest;
use irdeck_core::types::CaptureMode;

use crate::cli::SendOpts;
use crate::context::ensure_writable;

pub async fn cmd_send(client: &HubClient, opts: SendOpts) -> anyhow::Result<()> {
    ensure_writable(client)?;

    let mode = if opts.hold_ms.is_some() {
        CaptureMode::Hold
    } else {
        CaptureMode::Press
    };
    let request = SendRequest {
        button_id: opts.button_id,
        mode,
        hold_ms: opts.hold_ms,
    };

    let response = match client.send(&request).await {
        Ok(response) => response,
        // Recoverable: the remote has no agent assigned. Offer the picker
        // flow instead of a bare error.
        Err(e) if e.is_agent_required() => {
            eprintln!("{e}");
            let agents = client.agents().await?;
            if agents.is_empty() {
                eprintln!("no agents are registered; open a pairing window with `irdeck pairing open`");
            } else {
                eprintln!("available agents:");
                for agent in agents {
                    eprintln!("  {}  {}", agent.id, agent.name.as_deref().unwrap_or(""));
                }
                eprintln!("assign one with `irdeck remotes set <id> <name> --agent-id <agent>`");
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    match response.repeats {
        Some(repeats) if mode == CaptureMode::Hold => {
            println!("sent {mode} for button {} ({repeats} repeat frames)", opts.button_id);
        }
        _ => println!("sent {mode} for button {}", opts.button_id),
    }
    Ok(())
}
