//! Request/response models for the hub REST API.
//!
//! Field names and optionality mirror the hub's wire format. Response
//! models default every field the hub may omit so older hub versions
//! keep decoding.

use serde::{Deserialize, Serialize};

use irdeck_core::types::CaptureMode;

// ─── Remotes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remote {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub carrier_hz: Option<i64>,
    #[serde(default)]
    pub duty_cycle: Option<i64>,
    #[serde(default)]
    pub gap_us_default: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub assigned_agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCreate {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_hz: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_cycle: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<String>,
}

// ─── Buttons ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub id: i64,
    #[serde(default)]
    pub remote_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// ─── Sending ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub button_id: i64,
    pub mode: CaptureMode,
    /// Required for hold sends; the hub replays the repeat frame for this
    /// long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub button_id: Option<i64>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub hold_ms: Option<u64>,
    #[serde(default)]
    pub carrier_hz: Option<i64>,
    #[serde(default)]
    pub duty_cycle: Option<i64>,
    #[serde(default)]
    pub gap_us: Option<i64>,
    #[serde(default)]
    pub repeats: Option<i64>,
}

// ─── Learning ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnStartRequest {
    pub remote_id: i64,
    /// False clears the remote's buttons before learning.
    pub extend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnCaptureRequest {
    pub remote_id: i64,
    pub mode: CaptureMode,
    /// Press only. Omitted → hub settings default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub takes: Option<u32>,
    /// Omitted → hub settings default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub overwrite: bool,
    /// Press: omitted → the hub auto-names `BTN_0001`, `BTN_0002`, ...
    /// Hold: omitted → the hub uses the session's last captured button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_name: Option<String>,
}

/// The button record echoed back by a successful capture. The hub attaches
/// more columns than the wizard needs; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedButton {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnCaptureResponse {
    pub remote_id: i64,
    pub button: CapturedButton,
    /// Stored signal payload; opaque to the wizard.
    #[serde(default)]
    pub signals: serde_json::Value,
}

// ─── Agents ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// "local" or "mqtt".
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
    #[serde(default)]
    pub configuration_url: Option<String>,
    #[serde(default)]
    pub capabilities: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDebugUpdate {
    pub debug: bool,
}

/// ESP32 GPIO assignments; the hub validates the 0..=39 range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRuntimeConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir_rx_pin: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir_tx_pin: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOtaRequest {
    /// `x.y.z`; omitted → latest installable version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ─── Pairing ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingStatus {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Epoch seconds; absent when no window is open.
    #[serde(default)]
    pub expires_at: Option<f64>,
}

impl PairingStatus {
    pub fn is_open(&self) -> bool {
        self.session_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingOpenRequest {
    /// Clamped to 10..=3600 by the hub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

// ─── Settings & Status ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Health/section selector for `GET /status/{section}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSection {
    Electronics,
    Learning,
    Mqtt,
    Pairing,
}

impl StatusSection {
    pub const ALL: [Self; 4] = [Self::Electronics, Self::Learning, Self::Mqtt, Self::Pairing];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Learning => "learning",
            Self::Mqtt => "mqtt",
            Self::Pairing => "pairing",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub ir_device: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub learn_enabled: bool,
    #[serde(default)]
    pub learn_remote_id: Option<i64>,
    #[serde(default)]
    pub learn_remote_name: Option<String>,
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_request_omits_unset_fields() {
        let request = LearnCaptureRequest {
            remote_id: 7,
            mode: CaptureMode::Press,
            takes: None,
            timeout_ms: None,
            overwrite: false,
            button_name: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"remote_id": 7, "mode": "press", "overwrite": false})
        );
    }

    #[test]
    fn capture_request_with_all_fields() {
        let request = LearnCaptureRequest {
            remote_id: 7,
            mode: CaptureMode::Hold,
            takes: Some(5),
            timeout_ms: Some(3000),
            overwrite: true,
            button_name: Some("POWER".to_owned()),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["mode"], "hold");
        assert_eq!(json["takes"], 5);
        assert_eq!(json["timeout_ms"], 3000);
        assert_eq!(json["button_name"], "POWER");
    }

    #[test]
    fn capture_response_tolerates_extra_button_columns() {
        let response: LearnCaptureResponse = serde_json::from_str(
            r#"{"remote_id": 7,
                "button": {"id": 42, "name": "BTN_0001", "remote_id": 7, "icon": null},
                "signals": {"encoding": "signed_us_v1", "quality_score_press": 0.92}}"#,
        )
        .expect("deserialize");
        assert_eq!(response.button.id, 42);
        assert_eq!(response.button.name, "BTN_0001");
        assert_eq!(response.signals["encoding"], "signed_us_v1");
    }

    #[test]
    fn send_request_hold_includes_duration() {
        let request = SendRequest {
            button_id: 42,
            mode: CaptureMode::Hold,
            hold_ms: Some(750),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"button_id": 42, "mode": "hold", "hold_ms": 750})
        );
    }

    #[test]
    fn remote_decodes_with_minimal_fields() {
        let remote: Remote =
            serde_json::from_str(r#"{"id": 1, "name": "TV"}"#).expect("deserialize");
        assert_eq!(remote.name, "TV");
        assert_eq!(remote.carrier_hz, None);
    }

    #[test]
    fn theme_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Theme::System).expect("serialize"),
            serde_json::json!("system")
        );
    }

    #[test]
    fn pairing_status_open_iff_session_present() {
        let open: PairingStatus = serde_json::from_str(
            r#"{"session_id": "abc", "expires_at": 1750000000.0}"#,
        )
        .expect("deserialize");
        assert!(open.is_open());
        let closed: PairingStatus =
            serde_json::from_str(r#"{"session_id": null, "expires_at": null}"#)
                .expect("deserialize");
        assert!(!closed.is_open());
    }

    #[test]
    fn status_section_paths() {
        for section in StatusSection::ALL {
            assert!(!section.as_str().is_empty());
        }
        assert_eq!(StatusSection::Mqtt.as_str(), "mqtt");
    }

    #[test]
    fn health_decodes_hub_payload() {
        let health: Health = serde_json::from_str(
            r#"{"ok": true, "ir_device": "/dev/lirc0", "debug": false,
                "learn_enabled": true, "learn_remote_id": 7,
                "learn_remote_name": "Living Room"}"#,
        )
        .expect("deserialize");
        assert!(health.ok);
        assert_eq!(health.learn_remote_id, Some(7));
    }
}
