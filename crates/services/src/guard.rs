use quiz_core::model::{Answer, Attempt, QuizId, SessionState, SubmitTrigger};

use crate::error::SessionError;
use crate::submitter::QuizSubmitter;

/// At-most-once submission control for one attempt.
///
/// `claim` moves `Active → Submitting` exactly once and freezes the answers to
/// send. `dispatch` hands that snapshot to the collaborator; a failure leaves
/// the guard in `Submitting` so the same snapshot can be resent, unless the
/// collaborator reports that resending is unsafe.
#[derive(Debug)]
pub struct SubmissionGuard {
    state: SessionState,
    trigger: Option<SubmitTrigger>,
    pending: Vec<Answer>,
    attempt: Option<Attempt>,
    failures: u32,
    unresolved: bool,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Active,
            trigger: None,
            pending: Vec::new(),
            attempt: None,
            failures: 0,
            unresolved: false,
        }
    }

    /// Try to take the one submission slot. Returns `false` when another
    /// trigger already claimed it; the snapshot is then discarded.
    pub fn claim(&mut self, trigger: SubmitTrigger, snapshot: Vec<Answer>) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        self.state = SessionState::Submitting;
        self.trigger = Some(trigger);
        self.pending = snapshot;
        true
    }

    /// Send the claimed snapshot.
    ///
    /// Once submitted, further calls return the stored attempt without
    /// contacting the collaborator again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if nothing was claimed,
    /// `SessionError::Submission` if the collaborator fails, and
    /// `SessionError::SubmissionUnresolved` after a failure that must not be
    /// resent.
    pub async fn dispatch(
        &mut self,
        quiz_id: QuizId,
        submitter: &dyn QuizSubmitter,
    ) -> Result<Attempt, SessionError> {
        match self.state {
            SessionState::Active => Err(SessionError::NotSubmitting),
            SessionState::Submitted => self.attempt.clone().ok_or(SessionError::NotSubmitting),
            SessionState::Submitting if self.unresolved => {
                Err(SessionError::SubmissionUnresolved)
            }
            SessionState::Submitting => match submitter.submit(quiz_id, &self.pending).await {
                Ok(attempt) => {
                    self.state = SessionState::Submitted;
                    self.attempt = Some(attempt.clone());
                    Ok(attempt)
                }
                Err(err) => {
                    self.failures = self.failures.saturating_add(1);
                    self.unresolved = !err.is_retryable();
                    Err(err.into())
                }
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn trigger(&self) -> Option<SubmitTrigger> {
        self.trigger
    }

    /// Snapshot waiting to be (re)sent, if a submission is in flight.
    #[must_use]
    pub fn pending_answers(&self) -> Option<&[Answer]> {
        (self.state == SessionState::Submitting).then_some(self.pending.as_slice())
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// A failed submission may have been recorded remotely and cannot be resent.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use async_trait::async_trait;
    use quiz_core::model::{AttemptId, QuestionId};
    use quiz_core::time::fixed_now;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedSubmitter {
        calls: Mutex<Vec<Vec<Answer>>>,
        fail_first: Mutex<bool>,
    }

    #[async_trait]
    impl QuizSubmitter for ScriptedSubmitter {
        async fn submit(
            &self,
            quiz_id: QuizId,
            answers: &[Answer],
        ) -> Result<Attempt, SubmissionError> {
            self.calls.lock().unwrap().push(answers.to_vec());
            let mut fail = self.fail_first.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(SubmissionError::HttpStatus(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                ));
            }
            Ok(Attempt {
                id: AttemptId::new(1),
                quiz_id,
                score: 0,
                taken_at: fixed_now(),
                answers: Vec::new(),
            })
        }
    }

    fn snapshot() -> Vec<Answer> {
        vec![Answer::new(QuestionId::new(1), "True")]
    }

    #[test]
    fn only_first_claim_wins() {
        let mut guard = SubmissionGuard::new();
        assert!(guard.claim(SubmitTrigger::Timeout, snapshot()));
        assert!(!guard.claim(SubmitTrigger::Manual, Vec::new()));

        assert_eq!(guard.state(), SessionState::Submitting);
        assert_eq!(guard.trigger(), Some(SubmitTrigger::Timeout));
        assert_eq!(guard.pending_answers(), Some(snapshot().as_slice()));
    }

    #[tokio::test]
    async fn dispatch_without_claim_is_rejected() {
        let submitter = ScriptedSubmitter::default();
        let mut guard = SubmissionGuard::new();
        let err = guard.dispatch(QuizId::new(1), &submitter).await.unwrap_err();
        assert!(matches!(err, SessionError::NotSubmitting));
        assert!(submitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_stays_submitting_and_retry_resends_snapshot() {
        let submitter = ScriptedSubmitter {
            fail_first: Mutex::new(true),
            ..ScriptedSubmitter::default()
        };
        let mut guard = SubmissionGuard::new();
        guard.claim(SubmitTrigger::Manual, snapshot());

        let err = guard.dispatch(QuizId::new(1), &submitter).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(guard.state(), SessionState::Submitting);
        assert_eq!(guard.failures(), 1);
        assert!(!guard.claim(SubmitTrigger::Manual, Vec::new()));

        let attempt = guard.dispatch(QuizId::new(1), &submitter).await.unwrap();
        assert_eq!(attempt.id, AttemptId::new(1));
        assert_eq!(guard.state(), SessionState::Submitted);
        assert_eq!(guard.pending_answers(), None);

        let calls = submitter.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn submitted_guard_never_calls_again() {
        let submitter = ScriptedSubmitter::default();
        let mut guard = SubmissionGuard::new();
        guard.claim(SubmitTrigger::Manual, snapshot());
        guard.dispatch(QuizId::new(1), &submitter).await.unwrap();
        guard.dispatch(QuizId::new(1), &submitter).await.unwrap();

        assert_eq!(submitter.calls.lock().unwrap().len(), 1);
        assert!(guard.attempt().is_some());
    }

    struct AcceptedButUnreadable {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl QuizSubmitter for AcceptedButUnreadable {
        async fn submit(
            &self,
            _quiz_id: QuizId,
            _answers: &[Answer],
        ) -> Result<Attempt, SubmissionError> {
            *self.calls.lock().unwrap() += 1;
            Err(SubmissionError::UnreadableReceipt("expected value".into()))
        }
    }

    #[tokio::test]
    async fn unreadable_receipt_is_never_resent() {
        let submitter = AcceptedButUnreadable {
            calls: Mutex::new(0),
        };
        let mut guard = SubmissionGuard::new();
        guard.claim(SubmitTrigger::Timeout, snapshot());

        let err = guard.dispatch(QuizId::new(1), &submitter).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(guard.is_unresolved());

        let err = guard.dispatch(QuizId::new(1), &submitter).await.unwrap_err();
        assert!(matches!(err, SessionError::SubmissionUnresolved));
        assert_eq!(*submitter.calls.lock().unwrap(), 1);
        assert_eq!(guard.state(), SessionState::Submitting);
    }
}
