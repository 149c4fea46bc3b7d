//! Learning status reconciler.
//!
//! Three asynchronous inputs race for one in-memory status view: the
//! recurring HTTP poll, the push channel, and locally-initiated optimistic
//! state. The server emits no ordering token, so every accepted snapshot is
//! stamped with a client-assigned monotonic sequence number at receipt and
//! the merge resolves by channel tier + freshness: push is authoritative
//! while the push channel is fresh, otherwise the newest snapshot wins.
//! Within a channel, a snapshot with a lower sequence number than the one
//! already held is late (network reordering) and dropped.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

use crate::types::{DeckError, LearningStatus};

/// Freshness window for the push channel (seconds). A push snapshot older
/// than this no longer outranks polled data.
pub const PUSH_FRESH_SECS: i64 = 6;

// ─── Snapshots ────────────────────────────────────────────────────

/// Which channel delivered a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusChannel {
    /// WebSocket push — deterministic tier, preferred while fresh.
    Push,
    /// HTTP poll — heuristic fallback tier.
    Poll,
}

impl StatusChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for StatusChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server snapshot stamped at receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedStatus {
    pub channel: StatusChannel,
    pub seq: u64,
    pub received_at: DateTime<Utc>,
    pub status: LearningStatus,
}

/// Local optimistic overlay: the wizard has issued a start/capture and the
/// UI shows the session active without waiting for server confirmation.
#[derive(Debug, Clone, PartialEq)]
struct ActiveOverlay {
    remote_id: i64,
    remote_name: String,
    /// First sequence number that supersedes this overlay: any server
    /// snapshot stamped at or after it corrects the optimistic state.
    since_seq: u64,
}

// ─── Reconciler ───────────────────────────────────────────────────

/// Merges push, poll, and local-action inputs into the single
/// [`LearningStatus`] the UI renders.
#[derive(Debug, Default)]
pub struct Reconciler {
    next_seq: u64,
    push: Option<StampedStatus>,
    poll: Option<StampedStatus>,
    overlay: Option<ActiveOverlay>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a freshly received snapshot with the next sequence number.
    pub fn stamp(
        &mut self,
        channel: StatusChannel,
        status: LearningStatus,
        now: DateTime<Utc>,
    ) -> StampedStatus {
        let seq = self.next_seq;
        self.next_seq += 1;
        StampedStatus {
            channel,
            seq,
            received_at: now,
            status,
        }
    }

    /// Ingest a stamped snapshot. Returns false when the snapshot is late
    /// (lower sequence than the one already held for its channel) and was
    /// dropped.
    pub fn ingest(&mut self, snapshot: StampedStatus) -> bool {
        let slot = match snapshot.channel {
            StatusChannel::Push => &mut self.push,
            StatusChannel::Poll => &mut self.poll,
        };
        if let Some(current) = slot
            && snapshot.seq < current.seq
        {
            return false;
        }

        // Any server snapshot stamped after the overlay's birth corrects
        // the optimistic state, whether or not the server agrees.
        if let Some(overlay) = &self.overlay
            && snapshot.seq >= overlay.since_seq
        {
            self.overlay = None;
        }

        *slot = Some(snapshot);
        true
    }

    /// Stamp-and-ingest convenience for the common receive path.
    pub fn observe(
        &mut self,
        channel: StatusChannel,
        status: LearningStatus,
        now: DateTime<Utc>,
    ) -> bool {
        let snapshot = self.stamp(channel, status, now);
        self.ingest(snapshot)
    }

    /// Optimistically mark learning active for `remote_id` until the next
    /// server snapshot arrives. Avoids the visible flicker between issuing
    /// a start/capture and the server's confirmation.
    pub fn ensure_active(&mut self, remote_id: i64, remote_name: &str) {
        self.overlay = Some(ActiveOverlay {
            remote_id,
            remote_name: remote_name.to_owned(),
            since_seq: self.next_seq,
        });
    }

    /// Drop the optimistic overlay (wizard closed or stop issued).
    pub fn clear_local_action(&mut self) {
        self.overlay = None;
    }

    /// True when a push snapshot has been received within the freshness
    /// window. Callers use this to know whether the poll fallback is
    /// currently load-bearing.
    pub fn push_fresh(&self, now: DateTime<Utc>) -> bool {
        match &self.push {
            Some(snapshot) => {
                now.signed_duration_since(snapshot.received_at)
                    <= TimeDelta::seconds(PUSH_FRESH_SECS)
            }
            None => false,
        }
    }

    /// The single authoritative status the UI renders.
    pub fn view(&self, now: DateTime<Utc>) -> LearningStatus {
        let base = match (&self.push, &self.poll) {
            (Some(push), Some(poll)) => {
                if self.push_fresh(now) || push.seq >= poll.seq {
                    &push.status
                } else {
                    &poll.status
                }
            }
            (Some(push), None) => &push.status,
            (None, Some(poll)) => &poll.status,
            (None, None) => {
                return match &self.overlay {
                    Some(overlay) => overlay_status(overlay, LearningStatus::default()),
                    None => LearningStatus::default(),
                };
            }
        };

        match &self.overlay {
            Some(overlay) => overlay_status(overlay, base.clone()),
            None => base.clone(),
        }
    }
}

fn overlay_status(overlay: &ActiveOverlay, base: LearningStatus) -> LearningStatus {
    LearningStatus {
        learn_enabled: true,
        remote_id: Some(overlay.remote_id),
        remote_name: Some(overlay.remote_name.clone()),
        ..base
    }
}

// ─── Session Guard ────────────────────────────────────────────────

/// Enforce the single-active-session invariant client-side: every mutating
/// learning action for `editing_remote_id` must fail fast, without a
/// network call, when the lock is held by a different remote.
pub fn guard_remote(status: &LearningStatus, editing_remote_id: i64) -> Result<(), DeckError> {
    match status.active_remote() {
        Some((active_id, active_name)) if active_id != editing_remote_id => {
            Err(DeckError::SessionConflict {
                active_remote_id: Some(active_id),
                active_remote_name: Some(active_name.to_owned()),
            })
        }
        _ => Ok(()),
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().expect("valid ts")
    }

    fn active(remote_id: i64, name: &str) -> LearningStatus {
        LearningStatus {
            learn_enabled: true,
            remote_id: Some(remote_id),
            remote_name: Some(name.to_owned()),
            ..LearningStatus::default()
        }
    }

    fn inactive() -> LearningStatus {
        LearningStatus::default()
    }

    #[test]
    fn poll_is_authoritative_before_any_push() {
        let mut r = Reconciler::new();
        r.observe(StatusChannel::Poll, active(7, "Living Room"), at(0));
        let view = r.view(at(1));
        assert_eq!(view.active_remote(), Some((7, "Living Room")));
    }

    #[test]
    fn fresh_push_supersedes_newer_poll() {
        let mut r = Reconciler::new();
        r.observe(StatusChannel::Push, active(7, "Living Room"), at(0));
        r.observe(StatusChannel::Poll, inactive(), at(1));
        // Push is within the freshness window: it wins despite the poll
        // snapshot carrying a higher sequence number.
        let view = r.view(at(2));
        assert!(view.learn_enabled);
    }

    #[test]
    fn stale_push_falls_back_to_newer_poll() {
        let mut r = Reconciler::new();
        r.observe(StatusChannel::Push, active(7, "Living Room"), at(0));
        r.observe(StatusChannel::Poll, inactive(), at(30));
        let view = r.view(at(30));
        assert!(!view.learn_enabled, "stale push must not outrank the poll");
    }

    #[test]
    fn stale_push_still_wins_over_older_poll() {
        let mut r = Reconciler::new();
        r.observe(StatusChannel::Poll, inactive(), at(0));
        r.observe(StatusChannel::Push, active(7, "Living Room"), at(1));
        let view = r.view(at(60));
        assert!(view.learn_enabled, "push holds the higher sequence");
    }

    #[test]
    fn late_snapshot_is_dropped() {
        let mut r = Reconciler::new();
        let early = r.stamp(StatusChannel::Poll, inactive(), at(0));
        let later = r.stamp(StatusChannel::Poll, active(7, "Living Room"), at(1));
        assert!(r.ingest(later));
        assert!(!r.ingest(early), "reordered snapshot must be dropped");
        assert!(r.view(at(2)).learn_enabled);
    }

    #[test]
    fn overlay_shows_active_immediately() {
        let mut r = Reconciler::new();
        r.observe(StatusChannel::Poll, inactive(), at(0));
        r.ensure_active(7, "Living Room");
        let view = r.view(at(0));
        assert_eq!(view.active_remote(), Some((7, "Living Room")));
    }

    #[test]
    fn server_snapshot_corrects_overlay() {
        let mut r = Reconciler::new();
        r.ensure_active(7, "Living Room");
        assert!(r.view(at(0)).learn_enabled);
        // The server disagrees: the next snapshot wins over the overlay.
        r.observe(StatusChannel::Poll, inactive(), at(1));
        assert!(!r.view(at(1)).learn_enabled);
    }

    #[test]
    fn snapshot_stamped_before_overlay_does_not_clear_it() {
        let mut r = Reconciler::new();
        let stale = r.stamp(StatusChannel::Poll, inactive(), at(0));
        r.ensure_active(7, "Living Room");
        assert!(r.ingest(stale), "first snapshot for the channel is kept");
        assert!(
            r.view(at(0)).learn_enabled,
            "snapshot predating the overlay must not correct it"
        );
    }

    #[test]
    fn clear_local_action_removes_overlay() {
        let mut r = Reconciler::new();
        r.ensure_active(7, "Living Room");
        r.clear_local_action();
        assert!(!r.view(at(0)).learn_enabled);
    }

    #[test]
    fn push_freshness_tracking() {
        let mut r = Reconciler::new();
        assert!(!r.push_fresh(at(0)));
        r.observe(StatusChannel::Push, inactive(), at(0));
        assert!(r.push_fresh(at(PUSH_FRESH_SECS)));
        assert!(!r.push_fresh(at(PUSH_FRESH_SECS + 1)));
    }

    #[test]
    fn guard_rejects_conflicting_remote() {
        let status = active(3, "Projector");
        let err = guard_remote(&status, 7).expect_err("conflict");
        match err {
            DeckError::SessionConflict {
                active_remote_id,
                active_remote_name,
            } => {
                assert_eq!(active_remote_id, Some(3));
                assert_eq!(active_remote_name.as_deref(), Some("Projector"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn guard_allows_same_remote_and_idle() {
        assert!(guard_remote(&active(7, "Living Room"), 7).is_ok());
        assert!(guard_remote(&inactive(), 7).is_ok());
    }

    #[test]
    fn guard_ignores_stale_remote_fields() {
        let status = LearningStatus {
            learn_enabled: false,
            remote_id: Some(3),
            remote_name: Some("Projector".to_owned()),
            ..LearningStatus::default()
        };
        assert!(guard_remote(&status, 7).is_ok());
    }
}
