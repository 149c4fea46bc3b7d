//! `irdeck buttons` — button CRUD for one remote.

use irdeck_api::HubClient;
use irdeck_api::models::ButtonUpdate;

use crate::cli::ButtonsCmd;
use crate::context::ensure_writable;
use crate::render::{dash, row};

pub async fn cmd_buttons(client: &HubClient, command: ButtonsCmd) -> anyhow::Result<()> {
    match command {
        ButtonsCmd::List { remote_id } => {
            let buttons = client.buttons(remote_id).await?;
            if buttons.is_empty() {
                println!("remote {remote_id} has no buttons");
                return Ok(());
            }
            println!("{}", row(&[("ID", 6), ("NAME", 24), ("ICON", 16)]));
            for button in buttons {
                println!(
                    "{}",
                    row(&[
                        (&button.id.to_string(), 6),
                        (&button.name, 24),
                        (&dash(button.icon.as_deref()), 16),
                    ])
                );
            }
        }
        ButtonsCmd::Rename { button_id, name, icon } => {
            ensure_writable(client)?;
            let update = ButtonUpdate { name, icon };
            let button = client.update_button(button_id, &update).await?;
            println!("renamed button {} to {}", button.id, button.name);
        }
        ButtonsCmd::Rm { button_id } => {
            ensure_writable(client)?;
            client.delete_button(button_id).await?;
            println!("deleted button {button_id}");
        }
    }
    Ok(())
}
