use std::sync::Arc;

use quiz_core::model::{Quiz, QuizId};
use storage::repository::{AttemptRepository, QuizRepository};

use super::controller::QuizSession;
use crate::display::DisplaySurface;
use crate::error::SessionError;
use crate::submitter::QuizSubmitter;

/// Opens quiz sessions, enforcing the attempt limit.
#[derive(Clone)]
pub struct QuizSessionService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    submitter: Arc<dyn QuizSubmitter>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        submitter: Arc<dyn QuizSubmitter>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            submitter,
        }
    }

    /// Attempts left for the quiz, or `None` when attempts are unlimited.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if attempts cannot be counted.
    pub async fn remaining_attempts(&self, quiz: &Quiz) -> Result<Option<u32>, SessionError> {
        let Some(allowed) = quiz.attempts_allowed() else {
            return Ok(None);
        };
        let taken = self.attempts.count_attempts(quiz.id()).await?;
        Ok(Some(allowed.saturating_sub(taken)))
    }

    /// Load the quiz and build a session for it. Call `QuizSession::start`
    /// (or hand it to `run_session`) once the quiz is on screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the quiz cannot be loaded,
    /// `SessionError::Empty` if it has no questions, and
    /// `SessionError::AttemptsExhausted` when no attempts are left.
    pub async fn start_session(
        &self,
        quiz_id: QuizId,
        display: Box<dyn DisplaySurface>,
    ) -> Result<QuizSession, SessionError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        if quiz.questions().is_empty() {
            return Err(SessionError::Empty);
        }

        if let (Some(allowed), Some(0)) =
            (quiz.attempts_allowed(), self.remaining_attempts(&quiz).await?)
        {
            return Err(SessionError::AttemptsExhausted { quiz_id, allowed });
        }

        Ok(QuizSession::new(
            Arc::new(quiz),
            Arc::clone(&self.submitter),
            display,
        ))
    }
}
