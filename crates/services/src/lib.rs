#![forbid(unsafe_code)]

pub mod countdown;
pub mod display;
pub mod error;
pub mod guard;
pub mod quiz_session;
pub mod submitter;

pub use quiz_core::Clock;

pub use countdown::Countdown;
pub use display::{DisplaySurface, NullDisplay, QuestionView, RecordingDisplay, SessionView};
pub use error::{SessionError, SubmissionError};
pub use guard::SubmissionGuard;
pub use quiz_session::{
    QuizSession, QuizSessionService, SubmitOutcome, TimerEvent, TimerSource, UserAction,
    apply_action, run_session,
};
pub use submitter::{HttpSubmitter, HttpSubmitterConfig, QuizSubmitter, RepositorySubmitter};
