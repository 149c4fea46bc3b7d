//! `irdeck pairing` — time-boxed agent registration window.

use irdeck_api::HubClient;
use irdeck_api::models::PairingStatus;

use crate::cli::PairingCmd;
use crate::context::ensure_writable;
use crate::render::format_epoch;

pub async fn cmd_pairing(client: &HubClient, command: PairingCmd) -> anyhow::Result<()> {
    match command {
        PairingCmd::Status => {
            let status = client.pairing_status().await?;
            print_pairing(&status);
        }
        PairingCmd::Open { duration } => {
            ensure_writable(client)?;
            let status = client.pairing_open(duration).await?;
            print_pairing(&status);
        }
        PairingCmd::Close => {
            ensure_writable(client)?;
            client.pairing_close().await?;
            println!("pairing window closed");
        }
    }
    Ok(())
}

fn print_pairing(status: &PairingStatus) {
    if !status.is_open() {
        println!("pairing window closed");
        return;
    }
    match status.expires_at {
        Some(expires_at) => println!("pairing window open until {} (UTC)", format_epoch(expires_at)),
        None => println!("pairing window open"),
    }
}
