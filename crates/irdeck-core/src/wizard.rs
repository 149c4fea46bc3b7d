//! Wizard step controller.
//!
//! Pure, deterministic state machine for the guided learning flow:
//! `Press → Hold → Next → Summary`. It consumes outcomes (capture ok,
//! timeout, user choices) and returns decisions; the runtime performs all
//! IO and reports back. No clock or network access here.

use std::fmt;

use crate::types::CaptureMode;

// ─── State ────────────────────────────────────────────────────────

/// Current wizard step. The implicit "inactive" state before the wizard
/// opens is represented by not having a [`Wizard`] at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Press,
    Hold,
    Next,
    Summary,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Hold => "hold",
            Self::Next => "next",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the capture summary shown at the end of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRow {
    pub name: String,
    pub press: bool,
    pub hold: bool,
}

/// Local-only flag for a capture request that failed with a timeout
/// classification. The push log never emits a distinct timed-out entry,
/// so the wizard records which take was being waited on when the server
/// gave up. Cleared on the next capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutMarker {
    pub mode: CaptureMode,
    pub take: Option<u32>,
}

/// Whether an action requires a server-side stop call. The invariant is
/// "exactly one": closing from any non-summary step while this session
/// owns the learning lock stops the session; closing from `Summary` (or
/// after a stop was already decided) does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    StopSession,
    NoCall,
}

// ─── Wizard ───────────────────────────────────────────────────────

/// The wizard's local state. Created when the wizard opens, dropped when
/// it closes; never persisted.
#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    /// Opened in extend mode (keep existing buttons) vs reset mode.
    extend: bool,
    /// User-entered button name for the upcoming press capture; empty
    /// means auto-naming.
    button_name: String,
    active_button_id: Option<i64>,
    active_button_name: Option<String>,
    captured: Vec<CapturedRow>,
    timeout: Option<TimeoutMarker>,
    owns_session: bool,
}

impl Wizard {
    /// Open the wizard. All local state starts from scratch; the runtime
    /// issues the start-or-join request and reports via
    /// [`Wizard::session_started`].
    pub fn new(extend: bool) -> Self {
        Self {
            step: WizardStep::Press,
            extend,
            button_name: String::new(),
            active_button_id: None,
            active_button_name: None,
            captured: Vec::new(),
            timeout: None,
            owns_session: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn extend(&self) -> bool {
        self.extend
    }

    pub fn owns_session(&self) -> bool {
        self.owns_session
    }

    pub fn captured(&self) -> &[CapturedRow] {
        &self.captured
    }

    pub fn timeout_marker(&self) -> Option<TimeoutMarker> {
        self.timeout
    }

    pub fn active_button(&self) -> Option<(i64, &str)> {
        let id = self.active_button_id?;
        Some((id, self.active_button_name.as_deref().unwrap_or("")))
    }

    /// The start request succeeded: this wizard now owns the learning lock
    /// and is responsible for releasing it.
    pub fn session_started(&mut self) {
        self.owns_session = true;
    }

    /// Record the user-entered name for the next press capture.
    pub fn set_button_name(&mut self, name: &str) {
        self.button_name = name.trim().to_owned();
    }

    /// The button name the next press capture will target: the entered
    /// name, or the server's auto-name scheme (`BTN_XXXX`) predicted from
    /// `next_button_index`. `None` when neither is known — the capture
    /// request then omits the name and the server picks one.
    pub fn effective_button_name(&self, next_button_index: Option<i64>) -> Option<String> {
        if !self.button_name.is_empty() {
            return Some(self.button_name.clone());
        }
        next_button_index.map(|index| format!("BTN_{index:04}"))
    }

    /// Whether the upcoming press capture must pass `overwrite`. True when
    /// the target name already exists on the remote (exact, case-sensitive)
    /// and either the wizard extends an existing remote or this session
    /// itself created the button (re-capture).
    pub fn overwrite_for(&self, existing_names: &[&str], target_name: &str) -> bool {
        if !existing_names.contains(&target_name) {
            return false;
        }
        self.extend || self.captured.iter().any(|row| row.name == target_name)
    }

    /// A capture request is about to be issued; clear the timeout marker
    /// from any previous attempt.
    pub fn begin_capture(&mut self) {
        self.timeout = None;
    }

    /// A press capture succeeded. Records the returned button identity,
    /// upserts the summary row (a prior row with the same name is
    /// replaced), and advances to `Hold` — never skipping ahead.
    pub fn press_captured(&mut self, button_id: i64, button_name: &str) -> bool {
        if self.step != WizardStep::Press {
            return false;
        }
        self.active_button_id = Some(button_id);
        self.active_button_name = Some(button_name.to_owned());
        self.timeout = None;
        self.upsert_row(button_name);
        self.step = WizardStep::Hold;
        true
    }

    /// A hold capture succeeded for the active button.
    pub fn hold_captured(&mut self) -> bool {
        if self.step != WizardStep::Hold {
            return false;
        }
        let Some(name) = self.active_button_name.clone() else {
            return false;
        };
        if let Some(row) = self.captured.iter_mut().find(|row| row.name == name) {
            row.hold = true;
        }
        self.timeout = None;
        self.step = WizardStep::Next;
        true
    }

    /// A capture request failed with a timeout classification. Records the
    /// marker (with the take the interpreter was waiting on) and holds the
    /// current step so the user can retry.
    pub fn capture_timed_out(&mut self, mode: CaptureMode, waiting_take: Option<u32>) {
        self.timeout = Some(TimeoutMarker {
            mode,
            take: waiting_take,
        });
    }

    /// Skip the hold capture for this button.
    pub fn skip_hold(&mut self) -> bool {
        if self.step != WizardStep::Hold {
            return false;
        }
        self.step = WizardStep::Next;
        true
    }

    /// Capture another button: back to `Press` with the identity cleared.
    pub fn add_another(&mut self) -> bool {
        if self.step != WizardStep::Next {
            return false;
        }
        self.button_name.clear();
        self.active_button_id = None;
        self.active_button_name = None;
        self.timeout = None;
        self.step = WizardStep::Press;
        true
    }

    /// Finish the flow from `Next`. Returns `StopSession` when the caller
    /// must stop the server-side session before showing the summary.
    pub fn finish(&mut self) -> StopDecision {
        if self.step != WizardStep::Next {
            return StopDecision::NoCall;
        }
        self.step = WizardStep::Summary;
        if self.owns_session {
            self.owns_session = false;
            StopDecision::StopSession
        } else {
            StopDecision::NoCall
        }
    }

    /// Close the wizard from the current step. From `Summary` the session
    /// is already stopped; from any earlier step a wizard that owns the
    /// lock must release it — exactly once.
    pub fn close(&mut self) -> StopDecision {
        if self.step == WizardStep::Summary || !self.owns_session {
            return StopDecision::NoCall;
        }
        self.owns_session = false;
        StopDecision::StopSession
    }

    fn upsert_row(&mut self, name: &str) {
        let row = CapturedRow {
            name: name.to_owned(),
            press: true,
            hold: false,
        };
        match self.captured.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = row,
            None => self.captured.push(row),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_at_press() {
        let wizard = Wizard::new(false);
        assert_eq!(wizard.step(), WizardStep::Press);
        assert!(wizard.captured().is_empty());
        assert!(!wizard.owns_session());
    }

    #[test]
    fn press_success_always_goes_to_hold() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        assert!(wizard.press_captured(42, "BTN_0001"));
        assert_eq!(wizard.step(), WizardStep::Hold);
        assert_eq!(wizard.active_button(), Some((42, "BTN_0001")));
        assert_eq!(
            wizard.captured(),
            &[CapturedRow {
                name: "BTN_0001".to_owned(),
                press: true,
                hold: false,
            }]
        );
    }

    #[test]
    fn hold_success_marks_row_and_advances() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.press_captured(42, "BTN_0001");
        assert!(wizard.hold_captured());
        assert_eq!(wizard.step(), WizardStep::Next);
        assert!(wizard.captured()[0].hold);
    }

    #[test]
    fn hold_can_be_skipped() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.press_captured(42, "BTN_0001");
        assert!(wizard.skip_hold());
        assert_eq!(wizard.step(), WizardStep::Next);
        assert!(!wizard.captured()[0].hold);
    }

    #[test]
    fn add_another_clears_button_identity() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.set_button_name("POWER");
        wizard.press_captured(42, "POWER");
        wizard.hold_captured();
        assert!(wizard.add_another());
        assert_eq!(wizard.step(), WizardStep::Press);
        assert_eq!(wizard.active_button(), None);
        assert_eq!(wizard.effective_button_name(None), None);
        assert_eq!(wizard.captured().len(), 1, "summary rows survive");
    }

    #[test]
    fn finish_stops_exactly_once_then_summary() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.press_captured(42, "BTN_0001");
        wizard.skip_hold();
        assert_eq!(wizard.finish(), StopDecision::StopSession);
        assert_eq!(wizard.step(), WizardStep::Summary);
        // Closing from summary must not issue another stop.
        assert_eq!(wizard.close(), StopDecision::NoCall);
    }

    #[test]
    fn close_mid_flow_stops_exactly_once() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.press_captured(42, "BTN_0001");
        assert_eq!(wizard.close(), StopDecision::StopSession);
        assert_eq!(wizard.close(), StopDecision::NoCall);
    }

    #[test]
    fn close_without_session_ownership_makes_no_call() {
        // Start request failed: nothing to release.
        let mut wizard = Wizard::new(false);
        assert_eq!(wizard.close(), StopDecision::NoCall);
    }

    #[test]
    fn timeout_marker_set_and_cleared_on_next_attempt() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.capture_timed_out(CaptureMode::Press, Some(2));
        assert_eq!(
            wizard.timeout_marker(),
            Some(TimeoutMarker {
                mode: CaptureMode::Press,
                take: Some(2),
            })
        );
        assert_eq!(wizard.step(), WizardStep::Press, "timeout holds the step");
        wizard.begin_capture();
        assert_eq!(wizard.timeout_marker(), None);
    }

    #[test]
    fn recapture_replaces_row_and_resets_hold() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        wizard.press_captured(42, "POWER");
        wizard.hold_captured();
        wizard.add_another();
        wizard.press_captured(42, "POWER");
        assert_eq!(wizard.captured().len(), 1);
        assert!(!wizard.captured()[0].hold, "replaced row starts without hold");
    }

    #[test]
    fn effective_name_prefers_entered_name() {
        let mut wizard = Wizard::new(false);
        wizard.set_button_name("  POWER ");
        assert_eq!(wizard.effective_button_name(Some(3)), Some("POWER".to_owned()));
    }

    #[test]
    fn effective_name_predicts_auto_scheme() {
        let wizard = Wizard::new(false);
        assert_eq!(wizard.effective_button_name(Some(7)), Some("BTN_0007".to_owned()));
        assert_eq!(wizard.effective_button_name(Some(12)), Some("BTN_0012".to_owned()));
        assert_eq!(wizard.effective_button_name(None), None);
    }

    #[test]
    fn overwrite_in_extend_mode_for_existing_button() {
        let wizard = Wizard::new(true);
        assert!(wizard.overwrite_for(&["POWER", "VOL_UP"], "POWER"));
        assert!(!wizard.overwrite_for(&["POWER"], "VOL_UP"));
    }

    #[test]
    fn overwrite_in_reset_mode_only_for_session_created_buttons() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        // Name exists on the remote but was not created by this session:
        // the reset already cleared it server-side, so no overwrite.
        assert!(!wizard.overwrite_for(&["POWER"], "POWER"));
        wizard.press_captured(42, "POWER");
        wizard.skip_hold();
        wizard.add_another();
        // Re-capturing a button this session created replaces it.
        assert!(wizard.overwrite_for(&["POWER"], "POWER"));
    }

    #[test]
    fn overwrite_is_case_sensitive() {
        let wizard = Wizard::new(true);
        assert!(!wizard.overwrite_for(&["POWER"], "Power"));
    }

    #[test]
    fn out_of_step_events_are_rejected() {
        let mut wizard = Wizard::new(false);
        wizard.session_started();
        assert!(!wizard.hold_captured(), "no press captured yet");
        assert!(!wizard.skip_hold());
        assert!(!wizard.add_another());
        assert_eq!(wizard.finish(), StopDecision::NoCall);
        assert_eq!(wizard.step(), WizardStep::Press);
    }
}
