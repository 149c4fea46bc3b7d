//! `irdeck learn` — the interactive learning wizard.
//!
//! Wires the pure pieces together: the reconciler merges push frames, poll
//! snapshots, and optimistic local state; the interpreter derives capture
//! progress from the merged log; the wizard state machine decides
//! transitions; this module owns the IO. All inputs funnel into one event
//! channel so wizard state stays single-writer.

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::debug;

use irdeck_api::models::LearnCaptureResponse;
use irdeck_api::{ApiError, HubClient};
use irdeck_core::capture::{self, CaptureProgress, QualityReport};
use irdeck_core::reconcile::{Reconciler, StatusChannel, guard_remote};
use irdeck_core::types::{CaptureMode, LearningStatus};
use irdeck_core::wizard::{CapturedRow, StopDecision, Wizard, WizardStep};
use irdeck_transport::{ReconnectPolicy, StreamEvent, learn_status_stream};

use crate::cli::LearnOpts;
use crate::context::ensure_writable;
use crate::render::{row, yes_no};

/// HTTP poll fallback interval while the wizard is open.
const POLL_INTERVAL_MS: u64 = 2_000;

/// Everything that can wake the wizard loop.
enum LearnEvent {
    Push(StreamEvent<LearningStatus>),
    Poll(LearningStatus),
    Input(String),
    CaptureDone(Result<LearnCaptureResponse, ApiError>),
}

/// What a line of user input means at the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputAction {
    StartPressCapture { name: String },
    StartHoldCapture,
    SkipHold,
    AddAnother,
    Finish,
    Quit,
    Ignored,
}

pub async fn cmd_learn(client: &HubClient, opts: LearnOpts) -> anyhow::Result<i32> {
    ensure_writable(client)?;

    let mut reconciler = Reconciler::new();

    // Pre-check: the learning lock is a single-writer resource. If another
    // remote holds it, fail here without any mutating network call.
    let status = client.learn_status().await?;
    reconciler.observe(StatusChannel::Poll, status, Utc::now());
    if let Err(conflict) = guard_remote(&reconciler.view(Utc::now()), opts.remote_id) {
        eprintln!("{conflict}");
        eprintln!("stop that session first, then re-run learn");
        return Ok(1);
    }

    let remotes = client.remotes().await?;
    let Some(remote) = remotes.into_iter().find(|r| r.id == opts.remote_id) else {
        eprintln!("remote {} not found", opts.remote_id);
        return Ok(1);
    };
    let remote_name = remote.name;

    // Start or join the session. Optimistically show it active right away;
    // the next server snapshot corrects us if the hub disagrees.
    let mut wizard = Wizard::new(opts.extend);
    reconciler.ensure_active(opts.remote_id, &remote_name);
    match client.learn_start(opts.remote_id, opts.extend).await {
        Ok(status) => {
            wizard.session_started();
            reconciler.observe(StatusChannel::Poll, status, Utc::now());
        }
        Err(e) if e.is_conflict() => {
            // Someone is already learning. Joining is only valid when it is
            // this very remote (e.g. a wizard reopened after a crash).
            let status = client.learn_status().await?;
            let joined = status.is_active_for(opts.remote_id);
            reconciler.observe(StatusChannel::Poll, status, Utc::now());
            if joined {
                wizard.session_started();
                println!("joined the learning session already running for this remote");
            } else {
                reconciler.clear_local_action();
                eprintln!("{e}");
                return Ok(1);
            }
        }
        Err(e) => {
            reconciler.clear_local_action();
            return Err(e.into());
        }
    }

    println!(
        "learning for remote \"{remote_name}\" (id {}) — {} mode, {} takes, {} ms window",
        opts.remote_id,
        if opts.extend { "extend" } else { "reset" },
        opts.takes,
        opts.timeout_ms
    );

    // One event channel; push stream, poll loop, and stdin all feed it.
    let (tx, mut rx) = mpsc::channel::<LearnEvent>(64);

    let ws_url = client.config().ws_url("/learn/status/ws");
    let (stream_handle, mut stream_rx) = learn_status_stream(ws_url, ReconnectPolicy::default());
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = stream_rx.recv().await {
                if tx.send(LearnEvent::Push(event)).await.is_err() {
                    break;
                }
            }
        });
    }
    {
        let tx = tx.clone();
        let poll_client = client.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(POLL_INTERVAL_MS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match poll_client.learn_status().await {
                    Ok(status) => {
                        if tx.send(LearnEvent::Poll(status)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!(error = %e, "status poll failed"),
                }
            }
        });
    }
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(LearnEvent::Input(line)).await.is_err() {
                    break;
                }
            }
        });
    }

    let mut last_progress: Option<CaptureProgress> = None;
    let mut in_flight: Option<CaptureMode> = None;
    // Log index where the current button's capture began; scopes quality
    // extraction so one button's score never decorates the next.
    let mut button_start_index = 0usize;

    println!("{}", prompt_for(wizard.step()));

    let exit_code = loop {
        let event = tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(event) => event,
                None => break 0,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break 130;
            }
        };

        match event {
            LearnEvent::Push(StreamEvent::Connected) => {
                debug!("push channel connected");
            }
            LearnEvent::Push(StreamEvent::Disconnected { reason }) => {
                debug!(reason = %reason, "push channel dropped");
            }
            LearnEvent::Push(StreamEvent::Lapsed) => {
                println!("(push channel unavailable; progress falls back to polling)");
            }
            LearnEvent::Push(StreamEvent::Frame(status)) => {
                reconciler.observe(StatusChannel::Push, status, Utc::now());
                render_progress(&mut last_progress, &reconciler.view(Utc::now()));
            }
            LearnEvent::Poll(status) => {
                reconciler.observe(StatusChannel::Poll, status, Utc::now());
                render_progress(&mut last_progress, &reconciler.view(Utc::now()));
            }
            LearnEvent::Input(line) => {
                if in_flight.is_some() {
                    println!("(capture in progress — wait for it to finish)");
                    continue;
                }
                match parse_input(wizard.step(), &line) {
                    InputAction::Quit => break 0,
                    InputAction::StartPressCapture { name } => {
                        wizard.set_button_name(&name);
                        let existing = match client.buttons(opts.remote_id).await {
                            Ok(buttons) => buttons,
                            Err(e) => {
                                eprintln!("cannot list buttons: {e}");
                                continue;
                            }
                        };
                        let existing_names: Vec<&str> =
                            existing.iter().map(|b| b.name.as_str()).collect();
                        let view = reconciler.view(Utc::now());
                        let target = wizard.effective_button_name(view.next_button_index);
                        let overwrite = target
                            .as_deref()
                            .is_some_and(|name| wizard.overwrite_for(&existing_names, name));
                        wizard.begin_capture();
                        reconciler.ensure_active(opts.remote_id, &remote_name);
                        button_start_index = view.logs.len();
                        spawn_capture(
                            client,
                            &tx,
                            opts.remote_id,
                            CaptureMode::Press,
                            Some(opts.takes),
                            Some(opts.timeout_ms),
                            overwrite,
                            target,
                        );
                        in_flight = Some(CaptureMode::Press);
                    }
                    InputAction::StartHoldCapture => {
                        let name = match wizard.active_button() {
                            Some((_, name)) => name.to_owned(),
                            None => continue,
                        };
                        // Re-capturing a hold this session already stored
                        // replaces it.
                        let overwrite = wizard
                            .captured()
                            .iter()
                            .any(|row| row.name == name && row.hold);
                        wizard.begin_capture();
                        spawn_capture(
                            client,
                            &tx,
                            opts.remote_id,
                            CaptureMode::Hold,
                            None,
                            Some(opts.timeout_ms),
                            overwrite,
                            Some(name),
                        );
                        in_flight = Some(CaptureMode::Hold);
                    }
                    InputAction::SkipHold => {
                        if wizard.skip_hold() {
                            println!("{}", prompt_for(wizard.step()));
                        }
                    }
                    InputAction::AddAnother => {
                        if wizard.add_another() {
                            last_progress = None;
                            println!("{}", prompt_for(wizard.step()));
                        }
                    }
                    InputAction::Finish => {
                        if wizard.finish() == StopDecision::StopSession {
                            reconciler.clear_local_action();
                            if let Err(e) = client.learn_stop().await {
                                eprintln!("failed to stop learning session: {e}");
                            }
                        }
                        for line in summary_lines(wizard.captured()) {
                            println!("{line}");
                        }
                        break 0;
                    }
                    InputAction::Ignored => {
                        println!("{}", prompt_for(wizard.step()));
                    }
                }
            }
            LearnEvent::CaptureDone(result) => {
                let Some(mode) = in_flight.take() else {
                    continue;
                };
                match result {
                    Ok(response) => {
                        let view = reconciler.view(Utc::now());
                        match mode {
                            CaptureMode::Press => {
                                wizard.press_captured(response.button.id, &response.button.name);
                                println!(
                                    "press stored as \"{}\" (button id {})",
                                    response.button.name, response.button.id
                                );
                                if let Some(line) = quality_line(capture::quality_report(
                                    &view.logs,
                                    button_start_index,
                                    CaptureMode::Press,
                                )) {
                                    println!("{line}");
                                }
                            }
                            CaptureMode::Hold => {
                                wizard.hold_captured();
                                println!("hold stored for \"{}\"", response.button.name);
                                if let Some(line) = quality_line(capture::quality_report(
                                    &view.logs,
                                    button_start_index,
                                    CaptureMode::Hold,
                                )) {
                                    println!("{line}");
                                }
                            }
                        }
                        println!("{}", prompt_for(wizard.step()));
                    }
                    Err(e) if e.is_timeout() => {
                        let waiting = last_progress.as_ref().and_then(|p| p.waiting_take);
                        wizard.capture_timed_out(mode, waiting);
                        match waiting {
                            Some(take) => {
                                println!("capture timed out while waiting for take {take} — try again")
                            }
                            None => println!("capture timed out — try again"),
                        }
                        println!("{}", prompt_for(wizard.step()));
                    }
                    Err(e) => {
                        eprintln!("capture failed: {e}");
                        println!("{}", prompt_for(wizard.step()));
                    }
                }
            }
        }
    };

    // Unconditional teardown: the push channel belongs to this wizard, and
    // a wizard that still owns the lock must release it exactly once.
    stream_handle.close();
    reconciler.clear_local_action();
    if wizard.close() == StopDecision::StopSession {
        if let Err(e) = client.learn_stop().await {
            eprintln!("failed to stop learning session: {e}");
        }
    }

    Ok(exit_code)
}

// ─── IO helpers ───────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn spawn_capture(
    client: &HubClient,
    tx: &mpsc::Sender<LearnEvent>,
    remote_id: i64,
    mode: CaptureMode,
    takes: Option<u32>,
    timeout_ms: Option<u64>,
    overwrite: bool,
    button_name: Option<String>,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client
            .capture(remote_id, mode, takes, timeout_ms, overwrite, button_name)
            .await;
        let _ = tx.send(LearnEvent::CaptureDone(result)).await;
    });
}

fn render_progress(last: &mut Option<CaptureProgress>, view: &LearningStatus) {
    let Some(current) = capture::interpret(&view.logs) else {
        return;
    };
    for line in progress_lines(last.as_ref(), &current) {
        println!("{line}");
    }
    *last = Some(current);
}

// ─── Pure helpers ─────────────────────────────────────────────────

fn parse_input(step: WizardStep, line: &str) -> InputAction {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return InputAction::Quit;
    }
    match step {
        WizardStep::Press => InputAction::StartPressCapture {
            name: trimmed.to_owned(),
        },
        WizardStep::Hold => match trimmed {
            "" | "c" => InputAction::StartHoldCapture,
            "s" => InputAction::SkipHold,
            _ => InputAction::Ignored,
        },
        WizardStep::Next => match trimmed {
            "" | "f" => InputAction::Finish,
            "a" => InputAction::AddAnother,
            _ => InputAction::Ignored,
        },
        WizardStep::Summary => InputAction::Ignored,
    }
}

fn prompt_for(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Press => {
            "enter a button name to capture its press (empty = auto-name), q to quit"
        }
        WizardStep::Hold => "enter to capture the hold waveform, s to skip it, q to quit",
        WizardStep::Next => "enter to finish, a to capture another button, q to quit",
        WizardStep::Summary => "",
    }
}

/// Lines to print for a progress change. Announces a new capture, newly
/// captured takes, and changes of the awaited take.
fn progress_lines(previous: Option<&CaptureProgress>, current: &CaptureProgress) -> Vec<String> {
    if previous == Some(current) {
        return Vec::new();
    }
    let fresh = previous
        .is_none_or(|p| p.mode != current.mode || p.button_name != current.button_name);

    let mut lines = Vec::new();
    if fresh {
        match current.mode {
            CaptureMode::Press => {
                let target = current.button_name.as_deref().unwrap_or("next button");
                lines.push(format!(
                    "capturing press for \"{target}\" ({} takes)",
                    current.total_takes
                ));
            }
            CaptureMode::Hold => lines.push("capturing hold waveform".to_owned()),
        }
    }

    let previous_known = if fresh { None } else { previous };
    for take in &current.captured_takes {
        let already_seen = previous_known.is_some_and(|p| p.captured_takes.contains(take));
        if !already_seen {
            lines.push(format!("  captured take {take}/{}", current.total_takes));
        }
    }

    if !current.finished
        && let Some(take) = current.waiting_take
    {
        let already_waiting = previous_known.is_some_and(|p| p.waiting_take == Some(take));
        if !already_waiting {
            match current.mode {
                CaptureMode::Press => lines.push(format!(
                    "  waiting for IR press (take {take}/{})",
                    current.total_takes
                )),
                CaptureMode::Hold => {
                    lines.push("  waiting for IR hold (press and hold the button)".to_owned())
                }
            }
        }
    }

    lines
}

fn quality_line(report: Option<QualityReport>) -> Option<String> {
    let report = report?;
    let mut line = format!("quality: {} ({:.2})", report.grade.as_str(), report.score);
    if report.advisory {
        line.push_str(" — consider re-capturing this signal");
    }
    Some(line)
}

fn summary_lines(rows: &[CapturedRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["no buttons captured".to_owned()];
    }
    let mut lines = vec![row(&[("NAME", 24), ("PRESS", 6), ("HOLD", 5)])];
    for captured in rows {
        lines.push(row(&[
            (&captured.name, 24),
            (yes_no(captured.press), 6),
            (yes_no(captured.hold), 5),
        ]));
    }
    lines
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn press_progress(
        captured: &[u32],
        waiting: Option<u32>,
        finished: bool,
    ) -> CaptureProgress {
        CaptureProgress {
            mode: CaptureMode::Press,
            button_name: Some("BTN_0001".to_owned()),
            total_takes: 3,
            captured_takes: BTreeSet::from_iter(captured.iter().copied()),
            waiting_take: waiting,
            finished,
        }
    }

    #[test]
    fn press_step_input_is_a_button_name() {
        assert_eq!(
            parse_input(WizardStep::Press, " POWER "),
            InputAction::StartPressCapture {
                name: "POWER".to_owned()
            }
        );
        assert_eq!(
            parse_input(WizardStep::Press, ""),
            InputAction::StartPressCapture {
                name: String::new()
            }
        );
    }

    #[test]
    fn hold_step_inputs() {
        assert_eq!(parse_input(WizardStep::Hold, ""), InputAction::StartHoldCapture);
        assert_eq!(parse_input(WizardStep::Hold, "c"), InputAction::StartHoldCapture);
        assert_eq!(parse_input(WizardStep::Hold, "s"), InputAction::SkipHold);
        assert_eq!(parse_input(WizardStep::Hold, "x"), InputAction::Ignored);
    }

    #[test]
    fn next_step_inputs() {
        assert_eq!(parse_input(WizardStep::Next, ""), InputAction::Finish);
        assert_eq!(parse_input(WizardStep::Next, "f"), InputAction::Finish);
        assert_eq!(parse_input(WizardStep::Next, "a"), InputAction::AddAnother);
    }

    #[test]
    fn quit_works_at_every_step() {
        for step in [
            WizardStep::Press,
            WizardStep::Hold,
            WizardStep::Next,
            WizardStep::Summary,
        ] {
            assert_eq!(parse_input(step, "q"), InputAction::Quit, "step {step}");
            assert_eq!(parse_input(step, "Q"), InputAction::Quit, "step {step}");
        }
    }

    #[test]
    fn prompts_cover_interactive_steps() {
        for step in [WizardStep::Press, WizardStep::Hold, WizardStep::Next] {
            assert!(!prompt_for(step).is_empty(), "step {step}");
        }
    }

    #[test]
    fn fresh_capture_announces_itself() {
        let lines = progress_lines(None, &press_progress(&[], Some(1), false));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("BTN_0001"));
        assert!(lines[1].contains("take 1/3"));
    }

    #[test]
    fn only_new_takes_are_printed() {
        let previous = press_progress(&[1], Some(2), false);
        let current = press_progress(&[1, 2], Some(3), false);
        let lines = progress_lines(Some(&previous), &current);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("captured take 2/3"));
        assert!(lines[1].contains("take 3/3"));
    }

    #[test]
    fn unchanged_progress_prints_nothing() {
        let progress = press_progress(&[1], Some(2), false);
        assert!(progress_lines(Some(&progress.clone()), &progress).is_empty());
    }

    #[test]
    fn finished_progress_suppresses_waiting_line() {
        let previous = press_progress(&[1, 2], Some(3), false);
        let current = press_progress(&[1, 2, 3], Some(3), true);
        let lines = progress_lines(Some(&previous), &current);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("captured take 3/3"));
    }

    #[test]
    fn quality_line_formats_grade_and_advisory() {
        use irdeck_core::capture::{QualityGrade, QualityReport};
        let good = quality_line(Some(QualityReport {
            score: 0.92,
            grade: QualityGrade::Good,
            advisory: false,
        }))
        .expect("line");
        assert_eq!(good, "quality: good (0.92)");
        let low = quality_line(Some(QualityReport {
            score: 0.5,
            grade: QualityGrade::Low,
            advisory: true,
        }))
        .expect("line");
        assert!(low.contains("re-capturing"));
        assert_eq!(quality_line(None), None);
    }

    #[test]
    fn summary_table_lists_rows() {
        let rows = vec![
            CapturedRow {
                name: "POWER".to_owned(),
                press: true,
                hold: true,
            },
            CapturedRow {
                name: "VOL_UP".to_owned(),
                press: true,
                hold: false,
            },
        ];
        let lines = summary_lines(&rows);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("POWER"));
        assert!(lines[2].contains("VOL_UP"));
        assert!(lines[2].contains("no"));
    }

    #[test]
    fn empty_summary() {
        assert_eq!(summary_lines(&[]), vec!["no buttons captured".to_owned()]);
    }
}
