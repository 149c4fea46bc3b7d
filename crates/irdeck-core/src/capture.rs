//! Capture log interpreter.
//!
//! The hub reports capture progress only through human-readable log
//! messages. [`decode`] is the single place those strings are matched;
//! everything downstream consumes typed [`CaptureEvent`]s. Message
//! rewording on the server silently degrades to "no progress shown"
//! rather than failing, which is the contract for this compatibility
//! layer until the hub grows structured progress fields.

use std::collections::BTreeSet;

use crate::types::{CaptureMode, LogEntry};

// ─── Typed Events ─────────────────────────────────────────────────

/// A learning-log entry lifted into a typed event.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    SessionStarted,
    SessionStopped,
    PressStarted {
        button_name: Option<String>,
        takes: u32,
    },
    PressWaiting {
        take: u32,
    },
    PressTake {
        take: u32,
    },
    PressFinished {
        button_id: Option<i64>,
        quality: Option<f64>,
    },
    HoldStarted {
        button_id: Option<i64>,
    },
    HoldWaiting,
    HoldFinished {
        button_id: Option<i64>,
        quality: Option<f64>,
    },
}

impl CaptureEvent {
    /// True for the two markers that open a capture window.
    pub fn is_capture_start(&self) -> bool {
        matches!(self, Self::PressStarted { .. } | Self::HoldStarted { .. })
    }
}

/// Lift a log entry into a typed event. Exact-string match on `message`;
/// unrecognized messages (including debug chatter like raw engine output)
/// decode to `None` and are skipped.
pub fn decode(entry: &LogEntry) -> Option<CaptureEvent> {
    match entry.message.as_str() {
        "Learning session started" => Some(CaptureEvent::SessionStarted),
        "Learning session stopped" => Some(CaptureEvent::SessionStopped),
        "Capture press started" => Some(CaptureEvent::PressStarted {
            button_name: entry.data_str("button_name").map(str::to_owned),
            takes: entry.data_u32("takes")?,
        }),
        "Waiting for IR press" => Some(CaptureEvent::PressWaiting {
            take: entry.data_u32("take")?,
        }),
        "Captured press take" => Some(CaptureEvent::PressTake {
            take: entry.data_u32("take")?,
        }),
        "Capture press finished" => Some(CaptureEvent::PressFinished {
            button_id: entry.data_i64("button_id"),
            quality: entry.data_f64("quality"),
        }),
        "Capture hold started" => Some(CaptureEvent::HoldStarted {
            button_id: entry.data_i64("button_id"),
        }),
        "Waiting for IR hold (initial frame)" => Some(CaptureEvent::HoldWaiting),
        "Capture hold finished" => Some(CaptureEvent::HoldFinished {
            button_id: entry.data_i64("button_id"),
            quality: entry.data_f64("quality"),
        }),
        _ => None,
    }
}

// ─── Progress ─────────────────────────────────────────────────────

/// Derived view of the in-flight capture. Never persisted; recomputed from
/// scratch on every log change as a pure function of the log slice.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureProgress {
    pub mode: CaptureMode,
    pub button_name: Option<String>,
    /// Requested take count (press) or 1 (hold).
    pub total_takes: u32,
    pub captured_takes: BTreeSet<u32>,
    pub waiting_take: Option<u32>,
    pub finished: bool,
}

/// Interpret the log list into the progress of the most recent capture.
///
/// Scans backward for the latest capture-started marker; returns `None`
/// when no capture has been started. From that marker, folds forward over
/// the typed events of the slice.
pub fn interpret(logs: &[LogEntry]) -> Option<CaptureProgress> {
    let (start_index, mut progress) =
        logs.iter()
            .enumerate()
            .rev()
            .find_map(|(i, entry)| match decode(entry)? {
                CaptureEvent::PressStarted { button_name, takes } => Some((
                    i,
                    CaptureProgress {
                        mode: CaptureMode::Press,
                        button_name,
                        total_takes: takes,
                        captured_takes: BTreeSet::new(),
                        waiting_take: None,
                        finished: false,
                    },
                )),
                CaptureEvent::HoldStarted { .. } => Some((
                    i,
                    CaptureProgress {
                        mode: CaptureMode::Hold,
                        button_name: None,
                        total_takes: 1,
                        captured_takes: BTreeSet::new(),
                        waiting_take: None,
                        finished: false,
                    },
                )),
                _ => None,
            })?;

    for entry in &logs[start_index + 1..] {
        let Some(event) = decode(entry) else {
            continue;
        };
        match (progress.mode, event) {
            (CaptureMode::Press, CaptureEvent::PressWaiting { take }) => {
                progress.waiting_take = Some(take);
            }
            (CaptureMode::Press, CaptureEvent::PressTake { take }) => {
                progress.captured_takes.insert(take);
                progress.waiting_take = None;
            }
            (CaptureMode::Press, CaptureEvent::PressFinished { .. }) => {
                progress.finished = true;
                progress.waiting_take = None;
            }
            (CaptureMode::Hold, CaptureEvent::HoldWaiting) => {
                progress.waiting_take = Some(1);
            }
            (CaptureMode::Hold, CaptureEvent::HoldFinished { .. }) => {
                progress.finished = true;
                progress.waiting_take = None;
            }
            _ => {}
        }
    }

    Some(progress)
}

// ─── Quality ──────────────────────────────────────────────────────

/// User-facing grade for a capture quality score in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityGrade {
    Good,
    Ok,
    Low,
}

impl QualityGrade {
    /// Grade a score. Scores outside `[0,1]` are not graded at all.
    pub fn from_score(score: f64) -> Option<Self> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return None;
        }
        Some(if score >= 0.85 {
            Self::Good
        } else if score >= 0.70 {
            Self::Ok
        } else {
            Self::Low
        })
    }

    /// Low grades carry an advisory flag shown to the user.
    pub fn advisory(self) -> bool {
        matches!(self, Self::Low)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Ok => "ok",
            Self::Low => "low",
        }
    }
}

/// Quality of the most recent finished capture for `mode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    pub score: f64,
    pub grade: QualityGrade,
    pub advisory: bool,
}

/// Extract the quality of the most recent finished `mode` capture, scoped
/// to entries at or after `from_index` so one button's score never bleeds
/// into the next button's summary row.
pub fn quality_report(logs: &[LogEntry], from_index: usize, mode: CaptureMode) -> Option<QualityReport> {
    let slice = logs.get(from_index..)?;
    slice.iter().rev().find_map(|entry| {
        let quality = match (mode, decode(entry)?) {
            (CaptureMode::Press, CaptureEvent::PressFinished { quality, .. }) => quality,
            (CaptureMode::Hold, CaptureEvent::HoldFinished { quality, .. }) => quality,
            _ => return None,
        }?;
        let grade = QualityGrade::from_score(quality)?;
        Some(QualityReport {
            score: quality,
            grade,
            advisory: grade.advisory(),
        })
    })
}

// ─── Tests ────────────────────────────────────────────────────────
