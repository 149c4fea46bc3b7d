//! Client-side error taxonomy.
//!
//! This layer owns no server codes: classification first trusts a
//! machine-readable `code` field from the payload, then the HTTP status,
//! and only then falls back to pattern-matching the human-readable detail
//! string. The string patterns exist because the hub does not uniformly
//! emit codes; they are confined to [`classify`] so a server-side
//! rewording breaks exactly one function.

use std::fmt;

// ─── Kind ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network/connection failure: no HTTP status at all.
    Offline,
    /// 401 or a recognized invalid-api-key message.
    Unauthorized,
    /// 408: the physical capture window elapsed server-side.
    Timeout,
    /// 404 or recognized not-found message patterns.
    NotFound,
    /// 409 or recognized already-learning / signal-exists patterns.
    Conflict,
    /// 400/422 or recognized validation messages.
    BadRequest,
    /// Distinguished recoverable branch: the caller should offer an
    /// agent picker instead of a bare error display.
    AgentRequired,
    Generic,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "hub unreachable",
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad request",
            Self::AgentRequired => "agent required",
            Self::Generic => "hub error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Error ────────────────────────────────────────────────────────

/// A classified API failure carrying the HTTP status and raw payload.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status, absent for connection-level failures.
    pub status: Option<u16>,
    /// Machine-readable code from the payload, when the server sent one.
    pub code: Option<String>,
    /// Human-readable detail for display.
    pub detail: String,
    /// Raw error payload as received.
    pub raw: serde_json::Value,
}

impl ApiError {
    /// Connection-level failure before any HTTP status existed.
    pub fn offline(detail: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Offline,
            status: None,
            code: None,
            detail: detail.to_string(),
            raw: serde_json::Value::Null,
        }
    }

    /// A 2xx response whose body did not match the expected model.
    pub fn decode(status: u16, detail: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Generic,
            status: Some(status),
            code: None,
            detail: format!("invalid response body: {detail}"),
            raw: serde_json::Value::Null,
        }
    }

    /// Build a local (non-HTTP) error of the given kind.
    pub fn local(kind: ErrorKind, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            status: None,
            code: None,
            detail: detail.to_string(),
            raw: serde_json::Value::Null,
        }
    }

    /// Classify a non-2xx response from its status and body text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let raw: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        let code = raw
            .get("code")
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        let detail = ["detail", "message", "error"]
            .iter()
            .find_map(|key| raw.get(key).and_then(|v| v.as_str()))
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_owned()
                }
            });
        let kind = classify(status, code.as_deref(), &detail);
        Self {
            kind,
            status: Some(status),
            code,
            detail,
            raw,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }

    pub fn is_offline(&self) -> bool {
        self.kind == ErrorKind::Offline
    }

    pub fn is_agent_required(&self) -> bool {
        self.kind == ErrorKind::AgentRequired
    }
}

// ─── Classification ───────────────────────────────────────────────

/// Map a failed response to its kind: machine code first, HTTP status
/// second, message patterns last.
pub fn classify(status: u16, code: Option<&str>, detail: &str) -> ErrorKind {
    if let Some(kind) = classify_code(code) {
        return kind;
    }

    match status {
        401 => ErrorKind::Unauthorized,
        408 => ErrorKind::Timeout,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        400 | 422 => ErrorKind::BadRequest,
        _ => classify_detail(detail),
    }
}

fn classify_code(code: Option<&str>) -> Option<ErrorKind> {
    Some(match code? {
        "agent_required" => ErrorKind::AgentRequired,
        "unauthorized" | "invalid_api_key" => ErrorKind::Unauthorized,
        "timeout" => ErrorKind::Timeout,
        "not_found" => ErrorKind::NotFound,
        "conflict" => ErrorKind::Conflict,
        "bad_request" | "validation_error" => ErrorKind::BadRequest,
        _ => return None,
    })
}

/// Last-resort message patterns, matched case-insensitively against the
/// detail strings the hub is known to emit.
fn classify_detail(detail: &str) -> ErrorKind {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("invalid api key") {
        ErrorKind::Unauthorized
    } else if lower.contains("timed out") || lower.contains("timeout") {
        ErrorKind::Timeout
    } else if lower.contains("not found") || lower.contains("unknown button") {
        ErrorKind::NotFound
    } else if lower.contains("already running")
        || lower.contains("already exists")
        || lower.contains("different remote")
        || lower.contains("while learning")
    {
        ErrorKind::Conflict
    } else if lower.contains("must be") {
        ErrorKind::BadRequest
    } else {
        ErrorKind::Generic
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(classify(401, None, ""), ErrorKind::Unauthorized);
        assert_eq!(classify(408, None, ""), ErrorKind::Timeout);
        assert_eq!(classify(404, None, ""), ErrorKind::NotFound);
        assert_eq!(classify(409, None, ""), ErrorKind::Conflict);
        assert_eq!(classify(400, None, ""), ErrorKind::BadRequest);
        assert_eq!(classify(422, None, ""), ErrorKind::BadRequest);
        assert_eq!(classify(500, None, "boom"), ErrorKind::Generic);
    }

    #[test]
    fn machine_code_beats_status() {
        assert_eq!(
            classify(400, Some("agent_required"), "pick an agent"),
            ErrorKind::AgentRequired
        );
        assert_eq!(
            classify(500, Some("timeout"), ""),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn unknown_code_falls_through_to_status() {
        assert_eq!(classify(409, Some("weird_code"), ""), ErrorKind::Conflict);
    }

    #[test]
    fn detail_patterns_as_last_resort() {
        assert_eq!(
            classify(500, None, "Invalid API key"),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            classify(500, None, "Learning session is already running"),
            ErrorKind::Conflict
        );
        assert_eq!(
            classify(500, None, "Learning session is running for a different remote"),
            ErrorKind::Conflict
        );
        assert_eq!(
            classify(500, None, "Press signal already exists (set overwrite=true to replace)"),
            ErrorKind::Conflict
        );
        assert_eq!(
            classify(500, None, "receive timed out"),
            ErrorKind::Timeout
        );
        assert_eq!(classify(500, None, "takes must be > 0"), ErrorKind::BadRequest);
    }

    #[test]
    fn from_response_parses_fastapi_detail() {
        let err = ApiError::from_response(409, r#"{"detail": "Cannot send while learning is active"}"#);
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.status, Some(409));
        assert_eq!(err.detail, "Cannot send while learning is active");
        assert!(err.raw.get("detail").is_some(), "raw payload preserved");
    }

    #[test]
    fn from_response_parses_agent_error_shape() {
        let err = ApiError::from_response(
            400,
            r#"{"code": "agent_required", "message": "No agent assigned to this remote"}"#,
        );
        assert!(err.is_agent_required());
        assert_eq!(err.code.as_deref(), Some("agent_required"));
        assert_eq!(err.detail, "No agent assigned to this remote");
    }

    #[test]
    fn from_response_with_non_json_body() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.kind, ErrorKind::Generic);
        assert_eq!(err.detail, "Bad Gateway");
    }

    #[test]
    fn from_response_with_empty_body() {
        let err = ApiError::from_response(503, "");
        assert_eq!(err.detail, "HTTP 503");
    }

    #[test]
    fn offline_has_no_status() {
        let err = ApiError::offline("connection refused");
        assert!(err.is_offline());
        assert_eq!(err.status, None);
    }

    #[test]
    fn display_includes_kind_and_detail() {
        let err = ApiError::from_response(408, r#"{"detail": "receive timed out"}"#);
        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("receive timed out"));
    }
}
