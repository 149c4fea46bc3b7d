//! HTTP client for the hub REST API.
//!
//! Thin typed wrappers over a shared JSON request path: the API key header
//! is injected centrally, success bodies decode into models, and non-2xx
//! bodies classify into [`ApiError`]. No client-side request timeout is
//! imposed — capture calls legitimately block for the duration of the
//! physical capture window and the hub answers 408 when it elapses.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use irdeck_core::types::{CaptureMode, LearningStatus};

use crate::config::HubConfig;
use crate::error::ApiError;
use crate::models::{
    Agent, AgentDebugUpdate, AgentOtaRequest, AgentRuntimeConfigUpdate, AgentUpdate, Button,
    ButtonUpdate, Health, LearnCaptureRequest, LearnCaptureResponse, LearnStartRequest,
    PairingOpenRequest, PairingStatus, Remote, RemoteCreate, RemoteUpdate, SendRequest,
    SendResponse, Settings, SettingsUpdate, StatusSection,
};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    config: HubConfig,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    // ── Remotes ──────────────────────────────────────────────────

    pub async fn remotes(&self) -> Result<Vec<Remote>, ApiError> {
        self.execute(self.http.get(self.config.api_url("/remotes"))).await
    }

    pub async fn create_remote(&self, name: &str) -> Result<Remote, ApiError> {
        let body = RemoteCreate { name: name.to_owned() };
        self.execute(self.http.post(self.config.api_url("/remotes")).json(&body))
            .await
    }

    pub async fn update_remote(&self, remote_id: i64, update: &RemoteUpdate) -> Result<Remote, ApiError> {
        self.execute(
            self.http
                .put(self.config.api_url(&format!("/remotes/{remote_id}")))
                .json(update),
        )
        .await
    }

    pub async fn delete_remote(&self, remote_id: i64) -> Result<serde_json::Value, ApiError> {
        self.execute(self.http.delete(self.config.api_url(&format!("/remotes/{remote_id}"))))
            .await
    }

    // ── Buttons ──────────────────────────────────────────────────

    pub async fn buttons(&self, remote_id: i64) -> Result<Vec<Button>, ApiError> {
        self.execute(
            self.http
                .get(self.config.api_url(&format!("/remotes/{remote_id}/buttons"))),
        )
        .await
    }

    pub async fn update_button(&self, button_id: i64, update: &ButtonUpdate) -> Result<Button, ApiError> {
        self.execute(
            self.http
                .put(self.config.api_url(&format!("/buttons/{button_id}")))
                .json(update),
        )
        .await
    }

    pub async fn delete_button(&self, button_id: i64) -> Result<serde_json::Value, ApiError> {
        self.execute(self.http.delete(self.config.api_url(&format!("/buttons/{button_id}"))))
            .await
    }

    // ── Sending ──────────────────────────────────────────────────

    pub async fn send(&self, request: &SendRequest) -> Result<SendResponse, ApiError> {
        self.execute(self.http.post(self.config.api_url("/send")).json(request))
            .await
    }

    // ── Learning ─────────────────────────────────────────────────

    pub async fn learn_start(&self, remote_id: i64, extend: bool) -> Result<LearningStatus, ApiError> {
        let body = LearnStartRequest { remote_id, extend };
        self.execute(self.http.post(self.config.api_url("/learn/start")).json(&body))
            .await
    }

    pub async fn learn_stop(&self) -> Result<LearningStatus, ApiError> {
        self.execute(self.http.post(self.config.api_url("/learn/stop")))
            .await
    }

    pub async fn learn_status(&self) -> Result<LearningStatus, ApiError> {
        self.execute(self.http.get(self.config.api_url("/learn/status")))
            .await
    }

    pub async fn learn_capture(
        &self,
        request: &LearnCaptureRequest,
    ) -> Result<LearnCaptureResponse, ApiError> {
        self.execute(self.http.post(self.config.api_url("/learn/capture")).json(request))
            .await
    }

    /// Convenience for the wizard's press/hold capture path.
    pub async fn capture(
        &self,
        remote_id: i64,
        mode: CaptureMode,
        takes: Option<u32>,
        timeout_ms: Option<u64>,
        overwrite: bool,
        button_name: Option<String>,
    ) -> Result<LearnCaptureResponse, ApiError> {
        let request = capture_request(remote_id, mode, takes, timeout_ms, overwrite, button_name);
        self.learn_capture(&request).await
    }

    // ── Agents ───────────────────────────────────────────────────

    pub async fn agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.execute(self.http.get(self.config.api_url("/agents"))).await
    }

    pub async fn agent(&self, agent_id: &str) -> Result<Agent, ApiError> {
        self.execute(self.http.get(self.config.api_url(&format!("/agents/{agent_id}"))))
            .await
    }

    pub async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> Result<Agent, ApiError> {
        self.execute(
            self.http
                .put(self.config.api_url(&format!("/agents/{agent_id}")))
                .json(update),
        )
        .await
    }

    pub async fn set_agent_debug(&self, agent_id: &str, debug: bool) -> Result<serde_json::Value, ApiError> {
        let body = AgentDebugUpdate { debug };
        self.execute(
            self.http
                .put(self.config.api_url(&format!("/agents/{agent_id}/debug")))
                .json(&body),
        )
        .await
    }

    pub async fn set_agent_runtime_config(
        &self,
        agent_id: &str,
        update: &AgentRuntimeConfigUpdate,
    ) -> Result<serde_json::Value, ApiError> {
        self.execute(
            self.http
                .put(self.config.api_url(&format!("/agents/{agent_id}/runtime-config")))
                .json(update),
        )
        .await
    }

    pub async fn agent_logs(&self, agent_id: &str) -> Result<serde_json::Value, ApiError> {
        self.execute(self.http.get(self.config.api_url(&format!("/agents/{agent_id}/logs"))))
            .await
    }

    pub async fn reboot_agent(&self, agent_id: &str) -> Result<serde_json::Value, ApiError> {
        self.execute(self.http.post(self.config.api_url(&format!("/agents/{agent_id}/reboot"))))
            .await
    }

    pub async fn agent_ota(&self, agent_id: &str, version: Option<String>) -> Result<serde_json::Value, ApiError> {
        let body = AgentOtaRequest { version };
        self.execute(
            self.http
                .post(self.config.api_url(&format!("/agents/{agent_id}/ota")))
                .json(&body),
        )
        .await
    }

    // ── Pairing ──────────────────────────────────────────────────

    pub async fn pairing_status(&self) -> Result<PairingStatus, ApiError> {
        self.execute(self.http.get(self.config.api_url("/pairing/status")))
            .await
    }

    pub async fn pairing_open(&self, duration_seconds: Option<u64>) -> Result<PairingStatus, ApiError> {
        let body = PairingOpenRequest { duration_seconds };
        self.execute(self.http.post(self.config.api_url("/pairing/open")).json(&body))
            .await
    }

    pub async fn pairing_close(&self) -> Result<PairingStatus, ApiError> {
        self.execute(self.http.post(self.config.api_url("/pairing/close")))
            .await
    }

    // ── Status, Settings, Firmware ───────────────────────────────

    pub async fn status_section(&self, section: StatusSection) -> Result<serde_json::Value, ApiError> {
        self.execute(
            self.http
                .get(self.config.api_url(&format!("/status/{}", section.as_str()))),
        )
        .await
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.execute(self.http.get(self.config.api_url("/health"))).await
    }

    pub async fn settings(&self) -> Result<Settings, ApiError> {
        self.execute(self.http.get(self.config.api_url("/settings"))).await
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings, ApiError> {
        self.execute(self.http.put(self.config.api_url("/settings")).json(update))
            .await
    }

    pub async fn firmware(&self) -> Result<serde_json::Value, ApiError> {
        self.execute(self.http.get(self.config.api_url("/firmware"))).await
    }

    // ── Shared request path ──────────────────────────────────────

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let builder = match &self.config.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        };

        let response = builder.send().await.map_err(ApiError::offline)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::offline)?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ApiError::decode(status.as_u16(), e))
        } else {
            let error = ApiError::from_response(status.as_u16(), &body);
            debug!(status = status.as_u16(), kind = %error.kind, "hub request failed");
            Err(error)
        }
    }
}

/// Build a capture request, keeping `takes` press-only.
fn capture_request(
    remote_id: i64,
    mode: CaptureMode,
    takes: Option<u32>,
    timeout_ms: Option<u64>,
    overwrite: bool,
    button_name: Option<String>,
) -> LearnCaptureRequest {
    LearnCaptureRequest {
        remote_id,
        mode,
        takes: if mode == CaptureMode::Press { takes } else { None },
        timeout_ms,
        overwrite,
        button_name,
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_request_keeps_takes_for_press() {
        let request = capture_request(7, CaptureMode::Press, Some(5), Some(3000), false, None);
        assert_eq!(request.takes, Some(5));
        assert_eq!(request.timeout_ms, Some(3000));
    }

    #[test]
    fn capture_request_drops_takes_for_hold() {
        let request = capture_request(
            7,
            CaptureMode::Hold,
            Some(5),
            Some(6000),
            true,
            Some("POWER".to_owned()),
        );
        assert_eq!(request.takes, None, "takes is press-only");
        assert_eq!(request.button_name.as_deref(), Some("POWER"));
        assert!(request.overwrite);
    }
}
