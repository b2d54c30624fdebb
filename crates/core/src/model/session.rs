use std::fmt;

/// Lifecycle of one quiz session. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionState {
    Active,
    Submitting,
    Submitted,
}

impl SessionState {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Active)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Submitted)
    }
}

/// What asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitTrigger {
    Timeout,
    Manual,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitTrigger::Timeout => write!(f, "timeout"),
            SubmitTrigger::Manual => write!(f, "manual"),
        }
    }
}
