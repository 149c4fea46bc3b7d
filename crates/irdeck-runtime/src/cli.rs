//! CLI definition using clap derive.

use clap::{Args, Parser, Subcommand, ValueEnum};

use irdeck_api::models::{StatusSection, Theme};

#[derive(Parser)]
#[command(name = "irdeck", about = "Console for the IR remote hub")]
pub struct Cli {
    /// Hub API base URL (including the /api prefix)
    #[arg(
        long,
        global = true,
        env = "IRDECK_URL",
        default_value = "http://127.0.0.1:8000/api"
    )]
    pub url: String,

    /// API key sent as X-API-Key on every request
    #[arg(long, global = true, env = "IRDECK_API_KEY")]
    pub api_key: Option<String>,

    /// The hub rejects writes without an API key; fail them up front
    #[arg(long, global = true, env = "IRDECK_WRITE_REQUIRES_API_KEY")]
    pub write_requires_api_key: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage remotes
    #[command(subcommand)]
    Remotes(RemotesCmd),
    /// Manage buttons on a remote
    #[command(subcommand)]
    Buttons(ButtonsCmd),
    /// Send a button press or hold
    Send(SendOpts),
    /// Manage IR agents
    #[command(subcommand)]
    Agents(AgentsCmd),
    /// Open/close the agent pairing window
    #[command(subcommand)]
    Pairing(PairingCmd),
    /// Hub UI settings
    #[command(subcommand)]
    Settings(SettingsCmd),
    /// Show hub status sections
    Status(StatusOpts),
    /// List installable firmware versions
    Firmware,
    /// Hub health summary
    Health,
    /// Run the interactive learning wizard for a remote
    Learn(LearnOpts),
}

#[derive(Subcommand)]
pub enum RemotesCmd {
    /// List remotes
    List,
    /// Create a remote
    Add { name: String },
    /// Update a remote's name and transmit parameters
    Set {
        id: i64,
        name: String,
        #[arg(long)]
        carrier_hz: Option<i64>,
        #[arg(long)]
        duty_cycle: Option<i64>,
        #[arg(long)]
        icon: Option<String>,
        /// Agent id that routes this remote's sends
        #[arg(long)]
        agent_id: Option<String>,
    },
    /// Delete a remote and its buttons
    Rm { id: i64 },
}

#[derive(Subcommand)]
pub enum ButtonsCmd {
    /// List a remote's buttons
    List { remote_id: i64 },
    /// Rename a button
    Rename {
        button_id: i64,
        name: String,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a button
    Rm { button_id: i64 },
}

#[derive(Args)]
pub struct SendOpts {
    pub button_id: i64,
    /// Send the hold waveform for this many milliseconds instead of a press
    #[arg(long = "hold")]
    pub hold_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum AgentsCmd {
    /// List registered agents
    List,
    /// Show one agent
    Show { id: String },
    /// Update an agent's display name / configuration URL
    Set {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        configuration_url: Option<String>,
    },
    /// Toggle debug-level runtime logs on the agent
    Debug {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Assign IR receiver/transmitter GPIOs
    Pins {
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=39))]
        rx: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=39))]
        tx: Option<u8>,
    },
    /// Reboot the agent
    Reboot { id: String },
    /// Start an over-the-air firmware update
    Ota {
        id: String,
        /// x.y.z; omitted = latest installable
        #[arg(long)]
        version: Option<String>,
    },
    /// Show agent logs
    Logs {
        id: String,
        /// Stream logs over the push channel
        #[arg(long)]
        follow: bool,
    },
}

#[derive(Subcommand)]
pub enum PairingCmd {
    Status,
    Open {
        /// Window duration in seconds (hub clamps to 10..=3600)
        #[arg(long)]
        duration: Option<u64>,
    },
    Close,
}

#[derive(Subcommand)]
pub enum SettingsCmd {
    Show,
    Set {
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        /// UI language code (e.g. en, de, pt-PT)
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Args)]
pub struct StatusOpts {
    /// Section to show; omitted = all sections
    #[arg(value_enum)]
    pub section: Option<SectionArg>,
}

#[derive(Args)]
pub struct LearnOpts {
    pub remote_id: i64,
    /// Keep the remote's existing buttons instead of starting fresh
    #[arg(long)]
    pub extend: bool,
    /// Sample captures per press (signal quality improves with more)
    #[arg(long, default_value_t = 5)]
    pub takes: u32,
    /// Capture window in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,
}

// ─── Value enums ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    Electronics,
    Learning,
    Mqtt,
    Pairing,
}

impl From<SectionArg> for StatusSection {
    fn from(value: SectionArg) -> Self {
        match value {
            SectionArg::Electronics => Self::Electronics,
            SectionArg::Learning => Self::Learning,
            SectionArg::Mqtt => Self::Mqtt,
            SectionArg::Pairing => Self::Pairing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    System,
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::System => Self::System,
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}
