use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    Answer, AnswerSheet, Attempt, QuestionId, Quiz, SessionId, SessionState, SubmitTrigger,
};
use quiz_core::time::format_remaining;
use quiz_core::{GateState, QuestionGate, TimeLimit};
use tokio::sync::mpsc;

use crate::countdown::Countdown;
use crate::display::{DisplaySurface, QuestionView, SessionView, TIMEOUT_NOTICE};
use crate::error::SessionError;
use crate::guard::SubmissionGuard;
use crate::submitter::QuizSubmitter;

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Which countdown an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSource {
    Global,
    Question(QuestionId),
}

/// Posted by countdown callbacks onto the session's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { source: TimerSource, remaining: u32 },
    Expired { source: TimerSource },
}

/// Result of asking the session to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Attempt),
    /// Another trigger got there first; nothing was sent.
    AlreadyClaimed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass through a quiz.
///
/// The session owns every countdown it starts. Countdown callbacks only post
/// `TimerEvent`s; the owner feeds them back through `handle_timer_event`, one
/// at a time, interleaved with user actions.
pub struct QuizSession {
    id: SessionId,
    quiz: Arc<Quiz>,
    sheet: AnswerSheet,
    gates: HashMap<QuestionId, QuestionGate>,
    global_timer: Option<Countdown>,
    global_remaining: Option<u32>,
    question_timers: HashMap<QuestionId, Countdown>,
    guard: SubmissionGuard,
    submitter: Arc<dyn QuizSubmitter>,
    display: Box<dyn DisplaySurface>,
    events_tx: mpsc::UnboundedSender<TimerEvent>,
    events_rx: mpsc::UnboundedReceiver<TimerEvent>,
    started: bool,
    last_error: Option<String>,
    notice: Option<String>,
}

impl QuizSession {
    /// Build a session. Timers do not run until `start`.
    ///
    /// Timed questions the display cannot show a countdown for run untimed.
    #[must_use]
    pub fn new(
        quiz: Arc<Quiz>,
        submitter: Arc<dyn QuizSubmitter>,
        display: Box<dyn DisplaySurface>,
    ) -> Self {
        let id = SessionId::random();
        let mut gates = HashMap::new();
        for question in quiz.questions() {
            let Some(limit) = question.time_limit() else {
                continue;
            };
            if display.has_question_countdown(question.id()) {
                gates.insert(question.id(), QuestionGate::new(question.id(), limit));
            } else {
                log::warn!(
                    "session {id}: no countdown display for question {}; running it untimed",
                    question.id()
                );
            }
        }

        let global_remaining = quiz
            .time_limit()
            .map(|limit| u32::try_from(limit.as_secs()).unwrap_or(u32::MAX));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            id,
            quiz,
            sheet: AnswerSheet::new(),
            gates,
            global_timer: None,
            global_remaining,
            question_timers: HashMap::new(),
            guard: SubmissionGuard::new(),
            submitter,
            display,
            events_tx,
            events_rx,
            started: false,
            last_error: None,
            notice: None,
        }
    }

    /// The quiz view became active: start the whole-quiz countdown, if any.
    /// Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if let Some(limit) = self.quiz.time_limit() {
            log::info!(
                "session {}: quiz {} started with {} limit",
                self.id,
                self.quiz.id(),
                limit.label()
            );
            self.global_timer = Some(self.spawn_countdown(TimerSource::Global, limit));
        } else {
            log::info!("session {}: quiz {} started untimed", self.id, self.quiz.id());
        }
        self.render();
    }

    /// Acknowledge the prompt of a timed question and start its countdown.
    ///
    /// Returns `true` only when this call revealed the question. Untimed,
    /// revealed and locked questions are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` once the session left `Active` and
    /// `SessionError::UnknownQuestion` for ids outside the quiz.
    pub fn acknowledge(&mut self, question_id: QuestionId) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.quiz.question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id));
        }

        let Some(gate) = self.gates.get_mut(&question_id) else {
            return Ok(false);
        };
        if !gate.reveal() {
            log::debug!(
                "session {}: question {question_id} already {:?}",
                self.id,
                gate.state()
            );
            return Ok(false);
        }

        let limit = gate.limit();
        let timer = self.spawn_countdown(TimerSource::Question(question_id), limit);
        self.question_timers.insert(question_id, timer);
        self.render();
        Ok(true)
    }

    /// Record the selected choice for a question, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` once the session left `Active`,
    /// `SessionError::QuestionHidden` / `SessionError::QuestionLocked` when the
    /// question's gate refuses input, or `SessionError::UnknownQuestion`.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.quiz.question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        if let Some(gate) = self.gates.get(&question_id) {
            match gate.state() {
                GateState::Hidden => return Err(SessionError::QuestionHidden(question_id)),
                GateState::Locked => return Err(SessionError::QuestionLocked(question_id)),
                GateState::Revealed => {}
            }
        }

        self.sheet
            .set_answer(question_id, text)
            .map_err(|_| SessionError::Closed)?;
        self.render();
        Ok(())
    }

    /// Explicit submit from the user.
    ///
    /// # Errors
    ///
    /// See `submit`.
    pub async fn submit_now(&mut self) -> Result<SubmitOutcome, SessionError> {
        self.submit(SubmitTrigger::Manual).await
    }

    /// Claim the single submission slot and send the collected answers.
    ///
    /// Every timer is cancelled and the answer sheet sealed before the
    /// collaborator is called. Later calls return `SubmitOutcome::AlreadyClaimed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Submission` when the collaborator fails; the
    /// session stays in `Submitting` and `retry_submission` resends the same
    /// answers.
    pub async fn submit(&mut self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        let snapshot = self.sheet.answers().to_vec();
        if !self.guard.claim(trigger, snapshot) {
            log::debug!(
                "session {}: {trigger} submit ignored, session is {:?}",
                self.id,
                self.guard.state()
            );
            return Ok(SubmitOutcome::AlreadyClaimed);
        }

        log::info!(
            "session {}: {trigger} submit of {} answer(s)",
            self.id,
            self.sheet.len()
        );
        self.cancel_timers();
        self.sheet.seal();
        self.render();

        self.dispatch().await.map(SubmitOutcome::Submitted)
    }

    /// Resend the frozen answers after a failed submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if nothing was submitted yet,
    /// `SessionError::SubmissionUnresolved` if the last failure may already be
    /// recorded remotely, and `SessionError::Submission` if the collaborator
    /// fails again.
    pub async fn retry_submission(&mut self) -> Result<Attempt, SessionError> {
        if self.guard.state() != SessionState::Submitting {
            return self
                .guard
                .attempt()
                .cloned()
                .ok_or(SessionError::NotSubmitting);
        }
        if self.guard.is_unresolved() {
            return Err(SessionError::SubmissionUnresolved);
        }
        self.dispatch().await
    }

    /// Apply one event posted by a countdown.
    ///
    /// Events arriving after the session left `Active` are ignored. A global
    /// expiry submits; a question expiry only locks that question.
    ///
    /// # Errors
    ///
    /// Propagates submission failures from a timeout-triggered submit.
    pub async fn handle_timer_event(
        &mut self,
        event: TimerEvent,
    ) -> Result<Option<SubmitOutcome>, SessionError> {
        if !self.guard.state().is_active() {
            log::debug!("session {}: ignoring stale {event:?}", self.id);
            return Ok(None);
        }

        match event {
            TimerEvent::Tick {
                source: TimerSource::Global,
                remaining,
            } => {
                self.global_remaining = Some(remaining);
            }
            TimerEvent::Expired {
                source: TimerSource::Global,
            } => {
                self.global_remaining = Some(0);
                return self.submit(SubmitTrigger::Timeout).await.map(Some);
            }
            TimerEvent::Tick {
                source: TimerSource::Question(question_id),
                remaining,
            } => {
                if let Some(gate) = self.gates.get_mut(&question_id) {
                    gate.record_tick(remaining);
                }
            }
            TimerEvent::Expired {
                source: TimerSource::Question(question_id),
            } => {
                self.question_timers.remove(&question_id);
                if let Some(gate) = self.gates.get_mut(&question_id) {
                    if gate.lock() {
                        log::info!(
                            "session {}: time is up for question {question_id}, keeping {:?}",
                            self.id,
                            self.sheet.answer_for(question_id)
                        );
                    }
                }
            }
        }

        self.render();
        Ok(None)
    }

    /// Wait for the next countdown event.
    pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
        self.events_rx.recv().await
    }

    /// Take a queued countdown event without waiting.
    pub fn try_next_timer_event(&mut self) -> Option<TimerEvent> {
        self.events_rx.try_recv().ok()
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.guard.state()
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        self.sheet.answers()
    }

    /// `None` for untimed questions and ids outside the quiz.
    #[must_use]
    pub fn gate_state(&self, question_id: QuestionId) -> Option<GateState> {
        self.gates.get(&question_id).map(QuestionGate::state)
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&Attempt> {
        self.guard.attempt()
    }

    #[must_use]
    pub fn global_remaining(&self) -> Option<u32> {
        self.global_remaining
    }

    /// Number of countdowns still owned by the session.
    #[must_use]
    pub fn live_timers(&self) -> usize {
        let global = self
            .global_timer
            .as_ref()
            .is_some_and(Countdown::is_running);
        usize::from(global)
            + self
                .question_timers
                .values()
                .filter(|t| t.is_running())
                .count()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        let state = self.guard.state();
        let questions = self
            .quiz
            .questions()
            .iter()
            .map(|question| {
                let gate = self.gates.get(&question.id());
                QuestionView {
                    question_id: question.id(),
                    text: question.text().to_owned(),
                    kind: question.kind(),
                    choices: question.choices().to_vec(),
                    points: question.points(),
                    gate: gate.map(QuestionGate::state),
                    prompt: gate
                        .filter(|g| g.state() == GateState::Hidden)
                        .map(QuestionGate::prompt),
                    remaining: gate.map(QuestionGate::remaining_display),
                    locked: gate.is_some_and(QuestionGate::is_locked),
                    time_up: gate.and_then(QuestionGate::time_is_up),
                    selected: self.sheet.answer_for(question.id()).map(str::to_owned),
                }
            })
            .collect();

        SessionView {
            quiz_id: self.quiz.id(),
            title: self.quiz.title().to_owned(),
            state,
            global_remaining: self.global_remaining.map(format_remaining),
            questions,
            submit_enabled: state.is_active(),
            retry_available: state == SessionState::Submitting
                && self.last_error.is_some()
                && !self.guard.is_unresolved(),
            error: self.last_error.clone(),
            notice: self.notice.clone(),
            attempt: self.guard.attempt().cloned(),
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.guard.state().is_active() {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    async fn dispatch(&mut self) -> Result<Attempt, SessionError> {
        let result = self
            .guard
            .dispatch(self.quiz.id(), self.submitter.as_ref())
            .await;

        match &result {
            Ok(attempt) => {
                log::info!(
                    "session {}: attempt {} recorded with score {}",
                    self.id,
                    attempt.id,
                    attempt.score
                );
                self.last_error = None;
                if self.guard.trigger() == Some(SubmitTrigger::Timeout) {
                    self.notice = Some(TIMEOUT_NOTICE.to_owned());
                }
            }
            Err(err) => {
                log::warn!(
                    "session {}: submission failed ({} so far): {err}",
                    self.id,
                    self.guard.failures()
                );
                self.last_error = Some(err.to_string());
            }
        }

        self.render();
        result
    }

    fn spawn_countdown(&self, source: TimerSource, limit: TimeLimit) -> Countdown {
        let tick_tx = self.events_tx.clone();
        let expire_tx = self.events_tx.clone();
        Countdown::start(
            limit.as_secs(),
            move |remaining| {
                // The receiver lives as long as the session; a send error means it is gone.
                let _ = tick_tx.send(TimerEvent::Tick { source, remaining });
            },
            move || {
                let _ = expire_tx.send(TimerEvent::Expired { source });
            },
        )
    }

    fn cancel_timers(&mut self) {
        if let Some(mut timer) = self.global_timer.take() {
            timer.cancel();
        }
        for (_, mut timer) in self.question_timers.drain() {
            timer.cancel();
        }
    }

    fn render(&mut self) {
        let view = self.view();
        self.display.render(&view);
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("quiz_id", &self.quiz.id())
            .field("state", &self.guard.state())
            .field("answers_len", &self.sheet.len())
            .field("gates_len", &self.gates.len())
            .field("global_remaining", &self.global_remaining)
            .finish_non_exhaustive()
    }
}
