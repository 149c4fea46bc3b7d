//! Shared command context helpers.

use anyhow::bail;

use irdeck_api::HubClient;

/// Fail mutating commands up front when the hub is known to require an
/// API key that was not provided. The hub still enforces this with 401;
/// the pre-check only improves the error message.
pub fn ensure_writable(client: &HubClient) -> anyhow::Result<()> {
    if client.config().can_write() {
        return Ok(());
    }
    bail!("this hub requires an API key for writes; pass --api-key or set IRDECK_API_KEY");
}
