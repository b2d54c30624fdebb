mod controller;
mod driver;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use controller::{QuizSession, SubmitOutcome, TimerEvent, TimerSource};
pub use driver::{UserAction, apply_action, run_session};
pub use workflow::QuizSessionService;
