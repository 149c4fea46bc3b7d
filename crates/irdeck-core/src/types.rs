use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Log Entries ──────────────────────────────────────────────────

/// Severity of a server-pushed learning log entry.
///
/// The hub is free to add levels; anything unrecognized decodes as
/// [`LogLevel::Info`] so a single odd entry never poisons a snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "debug" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the learning session log.
///
/// Entries arrive from the server (poll or push), are append-only, and are
/// never mutated after arrival. The client treats the list as a replay log
/// from which transient capture progress is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch seconds (fractional) assigned by the server.
    pub timestamp: f64,
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
    /// Message-specific payload fields (`take`, `quality`, ...).
    #[serde(default)]
    pub data: serde_json::Value,
}

impl LogEntry {
    /// Read an unsigned integer field from the payload.
    pub fn data_u32(&self, key: &str) -> Option<u32> {
        self.data.get(key)?.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Read a signed integer field from the payload.
    pub fn data_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key)?.as_i64()
    }

    /// Read a float field from the payload (integers widen).
    pub fn data_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key)?.as_f64()
    }

    /// Read a string field from the payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key)?.as_str()
    }
}

// ─── Capture Mode ─────────────────────────────────────────────────

/// Which waveform slot a capture targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Press,
    Hold,
}

impl CaptureMode {
    pub const ALL: [Self; 2] = [Self::Press, Self::Hold];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "press" => Ok(Self::Press),
            "hold" => Ok(Self::Hold),
            _ => Err(DeckError::InvalidCaptureMode(s.to_owned())),
        }
    }
}

// ─── Learning Status ──────────────────────────────────────────────

/// Server-owned snapshot of the learning session.
///
/// The client never originates one of these; it only merges snapshots
/// received from HTTP polling and the push channel. When `learn_enabled`
/// is false every other field is stale and must be ignored.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStatus {
    pub learn_enabled: bool,
    #[serde(default)]
    pub remote_id: Option<i64>,
    #[serde(default)]
    pub remote_name: Option<String>,
    #[serde(default)]
    pub extend: Option<bool>,
    /// Epoch seconds at which the session started.
    #[serde(default)]
    pub started_at: Option<f64>,
    #[serde(default)]
    pub last_button_id: Option<i64>,
    #[serde(default)]
    pub last_button_name: Option<String>,
    /// Next index used for auto-generated `BTN_XXXX` names.
    #[serde(default)]
    pub next_button_index: Option<i64>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl LearningStatus {
    /// The remote currently holding the learning lock, if any.
    ///
    /// Returns `None` when `learn_enabled` is false, regardless of what the
    /// stale remote fields say.
    pub fn active_remote(&self) -> Option<(i64, &str)> {
        if !self.learn_enabled {
            return None;
        }
        let id = self.remote_id?;
        Some((id, self.remote_name.as_deref().unwrap_or("")))
    }

    /// True when a learning session is active for exactly this remote.
    pub fn is_active_for(&self, remote_id: i64) -> bool {
        matches!(self.active_remote(), Some((id, _)) if id == remote_id)
    }
}

// ─── Error ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    InvalidCaptureMode(String),
    /// The learning lock is held by a different remote. Mutating actions
    /// must fail fast client-side with this error instead of racing the
    /// server for the session.
    SessionConflict {
        active_remote_id: Option<i64>,
        active_remote_name: Option<String>,
    },
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCaptureMode(s) => write!(f, "invalid capture mode: {s}"),
            Self::SessionConflict {
                active_remote_id,
                active_remote_name,
            } => {
                let name = active_remote_name.as_deref().unwrap_or("unknown");
                match active_remote_id {
                    Some(id) => write!(f, "learning session is active for remote \"{name}\" (id {id})"),
                    None => write!(f, "learning session is active for remote \"{name}\""),
                }
            }
        }
    }
}

impl std::error::Error for DeckError {}

// ─── Tests ────────────────────────────────────────────────────────
