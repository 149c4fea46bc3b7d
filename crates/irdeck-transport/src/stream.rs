//! WebSocket push stream task.
//!
//! Owns one connection per open wizard, decodes inbound text frames via a
//! per-stream hook, and delivers events over an mpsc channel. Malformed
//! frames are dropped silently to keep the channel alive. Closing the
//! handle sets an inactive guard consulted before every delivery, so no
//! event reaches the caller after close even if the task is mid-frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use irdeck_core::types::{LearningStatus, LogEntry};

use crate::backoff::{ReconnectDecision, ReconnectPolicy, ReconnectTracker};

/// Events delivered by a push stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    Connected,
    Frame(T),
    /// An established connection dropped; a reconnect is scheduled.
    Disconnected { reason: String },
    /// The circuit breaker tripped: reconnects continue in the background
    /// but the caller should treat polling as authoritative. Emitted once
    /// per outage.
    Lapsed,
}

/// Handle to a running push stream. Closing is idempotent and guarantees
/// no further event delivery.
#[derive(Debug)]
pub struct StreamHandle {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Spawn a push stream for `url`. `decode` lifts each text frame into a
/// typed event; returning `None` drops the frame.
pub fn spawn_stream<T, F>(
    url: Url,
    policy: ReconnectPolicy,
    decode: F,
) -> (StreamHandle, mpsc::Receiver<StreamEvent<T>>)
where
    T: Send + 'static,
    F: Fn(&str) -> Option<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let active = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(run_stream(url, policy, decode, tx, Arc::clone(&active)));
    (StreamHandle { active, task }, rx)
}

/// Push stream for `/learn/status/ws` frames.
pub fn learn_status_stream(
    url: Url,
    policy: ReconnectPolicy,
) -> (StreamHandle, mpsc::Receiver<StreamEvent<LearningStatus>>) {
    spawn_stream(url, policy, decode_status_frame)
}

/// Push stream for `/agents/{id}/logs/ws` frames.
pub fn agent_log_stream(
    url: Url,
    policy: ReconnectPolicy,
) -> (StreamHandle, mpsc::Receiver<StreamEvent<LogEntry>>) {
    spawn_stream(url, policy, decode_log_frame)
}

fn decode_status_frame(text: &str) -> Option<LearningStatus> {
    serde_json::from_str(text).ok()
}

fn decode_log_frame(text: &str) -> Option<LogEntry> {
    serde_json::from_str(text).ok()
}

// ─── Stream task ─────────────────────────────────────────────────

async fn run_stream<T, F>(
    url: Url,
    policy: ReconnectPolicy,
    decode: F,
    tx: mpsc::Sender<StreamEvent<T>>,
    active: Arc<AtomicBool>,
) where
    F: Fn(&str) -> Option<T>,
{
    let mut tracker = ReconnectTracker::new(policy);
    let mut lapse_announced = false;

    while active.load(Ordering::SeqCst) {
        match connect_async(url.as_str()).await {
            Ok((mut ws, _)) => {
                tracker.record_success();
                lapse_announced = false;
                if !deliver(&tx, &active, StreamEvent::Connected).await {
                    return;
                }

                let reason = loop {
                    match ws.next().await {
                        Some(Ok(Message::Text(text))) => match decode(&text) {
                            Some(frame) => {
                                if !deliver(&tx, &active, StreamEvent::Frame(frame)).await {
                                    return;
                                }
                            }
                            None => debug!(len = text.len(), "dropping undecodable frame"),
                        },
                        Some(Ok(Message::Close(_))) => break "server closed the channel".to_owned(),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream ended".to_owned(),
                    }
                };
                if !deliver(&tx, &active, StreamEvent::Disconnected { reason }).await {
                    return;
                }
            }
            Err(e) => {
                debug!(url = %url, error = %e, "push channel connect failed");
            }
        }

        let decision = tracker.record_failure();
        if matches!(decision, ReconnectDecision::Lapsed { .. }) && !lapse_announced {
            lapse_announced = true;
            if !deliver(&tx, &active, StreamEvent::Lapsed).await {
                return;
            }
        }
        sleep(Duration::from_millis(decision.after_ms())).await;
    }
}

/// Deliver an event unless the handle was closed. Returns false when the
/// task should stop (closed handle or dropped receiver).
async fn deliver<T>(
    tx: &mpsc::Sender<StreamEvent<T>>,
    active: &AtomicBool,
    event: StreamEvent<T>,
) -> bool {
    if !active.load(Ordering::SeqCst) {
        return false;
    }
    tx.send(event).await.is_ok()
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_frame_decodes() {
        let status = decode_status_frame(
            r#"{"learn_enabled": true, "remote_id": 7, "remote_name": "Living Room", "logs": []}"#,
        )
        .expect("decode");
        assert!(status.is_active_for(7));
    }

    #[test]
    fn malformed_frames_are_dropped_not_fatal() {
        assert!(decode_status_frame("not json").is_none());
        assert!(decode_status_frame(r#"{"learn_enabled": "maybe"}"#).is_none());
        assert!(decode_log_frame("[1,2,3]").is_none());
    }

    #[test]
    fn log_frame_decodes() {
        let entry = decode_log_frame(
            r#"{"timestamp": 1750000000.5, "level": "info", "message": "boot", "data": {}}"#,
        )
        .expect("decode");
        assert_eq!(entry.message, "boot");
    }

    #[tokio::test]
    async fn closed_handle_delivers_nothing() {
        // Port 9 (discard) refuses the connection, so the task sits in the
        // backoff path without emitting events; closing must end the stream.
        let url = Url::parse("ws://127.0.0.1:9/learn/status/ws").expect("url");
        let (handle, mut rx) = learn_status_stream(url, ReconnectPolicy::default());
        handle.close();
        assert!(!handle.is_active());
        assert_eq!(rx.recv().await, None);
    }
}
