//! Write-only display contract for a running quiz session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use quiz_core::GateState;
use quiz_core::model::{Attempt, QuestionId, QuestionKind, QuizId, SessionState};

pub const TIMEOUT_NOTICE: &str = "Time's up! Your answers have been submitted.";

/// What the display shows for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    pub choices: Vec<String>,
    pub points: u32,
    /// `None` for untimed questions, which are always open.
    pub gate: Option<GateState>,
    /// Confirmation text while the question is still hidden.
    pub prompt: Option<String>,
    /// `m:ss` countdown for timed questions.
    pub remaining: Option<String>,
    pub locked: bool,
    pub time_up: Option<&'static str>,
    pub selected: Option<String>,
}

impl QuestionView {
    /// Body and choices are visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self.gate, Some(GateState::Hidden))
    }
}

/// Snapshot of everything a session exposes outward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub quiz_id: QuizId,
    pub title: String,
    pub state: SessionState,
    /// `m:ss` for the whole-quiz countdown, if the quiz has one.
    pub global_remaining: Option<String>,
    pub questions: Vec<QuestionView>,
    pub submit_enabled: bool,
    pub retry_available: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub attempt: Option<Attempt>,
}

impl SessionView {
    #[must_use]
    pub fn question(&self, question_id: QuestionId) -> Option<&QuestionView> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }
}

/// Where session state gets written.
pub trait DisplaySurface: Send {
    /// Whether this surface can show a countdown for `question_id`.
    /// Questions without one run untimed.
    fn has_question_countdown(&self, _question_id: QuestionId) -> bool {
        true
    }

    fn render(&mut self, view: &SessionView);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySurface for NullDisplay {
    fn render(&mut self, _view: &SessionView) {}
}

/// Keeps every rendered frame. Clones share the same frame buffer, so a copy
/// can be inspected after the original moved into a session.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    frames: Arc<Mutex<Vec<SessionView>>>,
    without_countdown: Arc<HashSet<QuestionId>>,
}

impl RecordingDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that has no countdown slot for the given questions.
    #[must_use]
    pub fn without_countdown_for(ids: impl IntoIterator<Item = QuestionId>) -> Self {
        Self {
            frames: Arc::default(),
            without_countdown: Arc::new(ids.into_iter().collect()),
        }
    }

    #[must_use]
    pub fn last(&self) -> Option<SessionView> {
        self.frames
            .lock()
            .ok()
            .and_then(|frames| frames.last().cloned())
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn frames(&self) -> Vec<SessionView> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn has_question_countdown(&self, question_id: QuestionId) -> bool {
        !self.without_countdown.contains(&question_id)
    }

    fn render(&mut self, view: &SessionView) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(view.clone());
        }
    }
}
