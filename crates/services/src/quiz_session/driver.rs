use quiz_core::model::{Attempt, QuestionId};
use tokio::sync::mpsc;

use super::controller::QuizSession;
use crate::error::SessionError;

/// Discrete inputs from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Acknowledge the prompt of a timed question.
    Reveal(QuestionId),
    SetAnswer {
        question_id: QuestionId,
        text: String,
    },
    Submit,
    /// Resend after a failed submission.
    Retry,
}

/// Apply one user action to the session.
///
/// # Errors
///
/// Returns whatever the session rejects the action with.
pub async fn apply_action(
    session: &mut QuizSession,
    action: UserAction,
) -> Result<(), SessionError> {
    match action {
        UserAction::Reveal(question_id) => session.acknowledge(question_id).map(|_| ()),
        UserAction::SetAnswer { question_id, text } => session.set_answer(question_id, text),
        UserAction::Submit => session.submit_now().await.map(|_| ()),
        UserAction::Retry => session.retry_submission().await.map(|_| ()),
    }
}

/// Run a session to completion on a single event queue.
///
/// Countdown events and user actions are handled one at a time in arrival
/// order. Rejected actions and failed submissions are logged and the loop
/// keeps going; the display already shows them.
///
/// # Errors
///
/// Returns `SessionError::Abandoned` if the action channel closes before the
/// attempt is recorded. Dropping the session cancels its timers.
pub async fn run_session(
    mut session: QuizSession,
    mut actions: mpsc::Receiver<UserAction>,
) -> Result<Attempt, SessionError> {
    session.start();

    loop {
        if let Some(attempt) = session.attempt() {
            return Ok(attempt.clone());
        }

        let result = tokio::select! {
            Some(event) = session.next_timer_event() => {
                session.handle_timer_event(event).await.map(|_| ())
            }
            action = actions.recv() => {
                let Some(action) = action else {
                    log::info!("session {}: abandoned in state {:?}", session.id(), session.state());
                    return Err(SessionError::Abandoned);
                };
                apply_action(&mut session, action).await
            }
        };

        if let Err(err) = result {
            if err.is_retryable() {
                log::warn!("session {}: {err}", session.id());
            } else {
                log::debug!("session {}: rejected: {err}", session.id());
            }
        }
    }
}
