//! Reveal/lock state machine for a question with its own time budget.

use crate::model::QuestionId;
use crate::time::{TimeLimit, format_remaining};

pub const TIME_UP_NOTICE: &str = "Time is up for this question.";

/// Where a timed question is in its lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateState {
    /// Confirmation prompt shown, body hidden, timer not started.
    Hidden,
    /// Timer running, input accepted.
    Revealed,
    /// Timer expired, input frozen.
    Locked,
}

/// Gate for one timed question.
///
/// The gate does not own a timer. `reveal` tells the caller whether a timer
/// must be started and `lock` whether the question just froze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGate {
    question_id: QuestionId,
    limit: TimeLimit,
    state: GateState,
    remaining_secs: u32,
}

impl QuestionGate {
    #[must_use]
    pub fn new(question_id: QuestionId, limit: TimeLimit) -> Self {
        Self {
            question_id,
            limit,
            state: GateState::Hidden,
            remaining_secs: u32::try_from(limit.as_secs()).unwrap_or(u32::MAX),
        }
    }

    /// `Hidden → Revealed`. Returns `true` only on the transition itself, so
    /// repeated acknowledgements never restart the timer.
    pub fn reveal(&mut self) -> bool {
        if self.state != GateState::Hidden {
            return false;
        }
        self.state = GateState::Revealed;
        true
    }

    /// `Revealed → Locked`. Returns `true` only on the transition itself.
    pub fn lock(&mut self) -> bool {
        if self.state != GateState::Revealed {
            return false;
        }
        self.state = GateState::Locked;
        self.remaining_secs = 0;
        true
    }

    /// Track the latest tick from this question's countdown.
    /// Ignored unless the question is live.
    pub fn record_tick(&mut self, remaining_secs: u32) {
        if self.state == GateState::Revealed {
            self.remaining_secs = remaining_secs;
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn limit(&self) -> TimeLimit {
        self.limit
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub fn accepts_input(&self) -> bool {
        self.state == GateState::Revealed
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state == GateState::Locked
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn remaining_display(&self) -> String {
        format_remaining(self.remaining_secs)
    }

    /// Marker shown on a locked question.
    #[must_use]
    pub fn time_is_up(&self) -> Option<&'static str> {
        self.is_locked().then_some(TIME_UP_NOTICE)
    }

    /// Confirmation text shown while the question is hidden.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "This is a timed question: The timer will start when you press OK.\n\n\
             Time Limit: {}.\n\nAre you sure you want to enter?",
            self.limit.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QuestionGate {
        QuestionGate::new(QuestionId::new(1), TimeLimit::from_minutes(1))
    }

    #[test]
    fn starts_hidden_with_full_budget() {
        let g = gate();
        assert_eq!(g.state(), GateState::Hidden);
        assert!(!g.accepts_input());
        assert_eq!(g.remaining_secs(), 60);
        assert_eq!(g.remaining_display(), "1:00");
    }

    #[test]
    fn reveal_happens_once() {
        let mut g = gate();
        assert!(g.reveal());
        assert!(!g.reveal());
        assert_eq!(g.state(), GateState::Revealed);
        assert!(g.accepts_input());
    }

    #[test]
    fn cannot_lock_a_hidden_question() {
        let mut g = gate();
        assert!(!g.lock());
        assert_eq!(g.state(), GateState::Hidden);
    }

    #[test]
    fn locked_never_regresses() {
        let mut g = gate();
        g.reveal();
        assert!(g.lock());
        assert!(!g.lock());
        assert!(!g.reveal());
        assert_eq!(g.state(), GateState::Locked);
        assert!(!g.accepts_input());
        assert_eq!(g.time_is_up(), Some(TIME_UP_NOTICE));
    }

    #[test]
    fn ticks_only_count_while_revealed() {
        let mut g = gate();
        g.record_tick(10);
        assert_eq!(g.remaining_secs(), 60);

        g.reveal();
        g.record_tick(42);
        assert_eq!(g.remaining_display(), "0:42");

        g.lock();
        g.record_tick(5);
        assert_eq!(g.remaining_secs(), 0);
    }

    #[test]
    fn prompt_names_the_limit() {
        let g = QuestionGate::new(QuestionId::new(2), TimeLimit::from_minutes(3));
        assert!(g.prompt().contains("Time Limit: 3 Minutes."));
        assert!(gate().prompt().contains("Time Limit: 1 Minute."));
    }
}
