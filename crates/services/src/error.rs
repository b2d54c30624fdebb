//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionId, QuizId};
use storage::repository::StorageError;

/// Errors emitted by a `QuizSubmitter`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("submission endpoint is not configured")]
    Disabled,
    #[error("submission rejected with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("submission was accepted but its receipt could not be read: {0}")]
    UnreadableReceipt(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SubmissionError {
    /// Whether sending the same answers again is safe.
    ///
    /// An unreadable receipt means the server already recorded an attempt we
    /// cannot identify; resending would record another one.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SubmissionError::UnreadableReceipt(_))
    }
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no questions")]
    Empty,
    #[error("no attempts left for quiz {quiz_id} ({allowed} allowed)")]
    AttemptsExhausted { quiz_id: QuizId, allowed: u32 },
    #[error("session is no longer accepting input")]
    Closed,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("question {0} has not been revealed")]
    QuestionHidden(QuestionId),
    #[error("time is up for question {0}")]
    QuestionLocked(QuestionId),
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),
    #[error("submission outcome is unknown; it cannot be resent")]
    SubmissionUnresolved,
    #[error("session abandoned before submission")]
    Abandoned,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether retrying the submission can still succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Submission(err) if err.is_retryable())
    }
}
