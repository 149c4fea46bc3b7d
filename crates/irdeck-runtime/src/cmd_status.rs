//! `irdeck status` / `health` / `firmware` / `settings` — hub inspection.

use irdeck_api::HubClient;
use irdeck_api::models::{SettingsUpdate, StatusSection};

use crate::cli::{SettingsCmd, StatusOpts};
use crate::context::ensure_writable;
use crate::render::{dash, print_json, yes_no};

pub async fn cmd_status(client: &HubClient, opts: StatusOpts) -> anyhow::Result<()> {
    let sections: Vec<StatusSection> = match opts.section {
        Some(section) => vec![section.into()],
        None => StatusSection::ALL.to_vec(),
    };

    for section in sections {
        let value = client.status_section(section).await?;
        println!("[{}]", section.as_str());
        print_json(&value);
    }
    Ok(())
}

pub async fn cmd_health(client: &HubClient) -> anyhow::Result<()> {
    let health = client.health().await?;
    println!("ok:            {}", yes_no(health.ok));
    println!("ir device:     {}", dash(health.ir_device.as_deref()));
    println!("debug:         {}", yes_no(health.debug));
    println!("learning:      {}", yes_no(health.learn_enabled));
    if health.learn_enabled {
        println!(
            "learning for:  {} (id {})",
            dash(health.learn_remote_name.as_deref()),
            dash(health.learn_remote_id),
        );
    }
    Ok(())
}

pub async fn cmd_firmware(client: &HubClient) -> anyhow::Result<()> {
    let catalog = client.firmware().await?;
    print_json(&catalog);
    Ok(())
}

pub async fn cmd_settings(client: &HubClient, command: SettingsCmd) -> anyhow::Result<()> {
    match command {
        SettingsCmd::Show => {
            let settings = client.settings().await?;
            println!("theme:     {}", dash(settings.theme.map(|t| t.as_str())));
            println!("language:  {}", dash(settings.language.as_deref()));
        }
        SettingsCmd::Set { theme, language } => {
            ensure_writable(client)?;
            let update = SettingsUpdate {
                theme: theme.map(Into::into),
                language,
            };
            client.update_settings(&update).await?;
            println!("settings updated");
        }
    }
    Ok(())
}
