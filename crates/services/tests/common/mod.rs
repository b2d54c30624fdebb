#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::TimeLimit;
use quiz_core::model::{Answer, Attempt, AttemptId, Question, QuestionId, Quiz, QuizId};
use quiz_core::time::fixed_now;
use services::{
    DisplaySurface, QuizSession, QuizSubmitter, RecordingDisplay, SubmissionError,
    SubmitOutcome,
};

/// Records every submission; fails the first `failures` calls.
#[derive(Default)]
pub struct CountingSubmitter {
    calls: Mutex<Vec<Vec<Answer>>>,
    failures: AtomicUsize,
}

impl CountingSubmitter {
    pub fn failing(times: usize) -> Self {
        Self {
            calls: Mutex::default(),
            failures: AtomicUsize::new(times),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Answer>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizSubmitter for CountingSubmitter {
    async fn submit(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
    ) -> Result<Attempt, SubmissionError> {
        let call_no = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(answers.to_vec());
            calls.len()
        };
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SubmissionError::HttpStatus(
                reqwest::StatusCode::BAD_GATEWAY,
            ));
        }
        Ok(Attempt {
            id: AttemptId::new(call_no as u64),
            quiz_id,
            score: 0,
            taken_at: fixed_now(),
            answers: Vec::new(),
        })
    }
}

pub fn qid(id: u64) -> QuestionId {
    QuestionId::new(id)
}

pub fn mcq(id: u64, minutes: Option<u32>) -> Question {
    Question::multiple_choice(
        qid(id),
        format!("Question {id}"),
        vec!["a".into(), "b".into(), "c".into()],
        "a",
        1,
    )
    .unwrap()
    .with_time_limit(minutes.map(TimeLimit::from_minutes))
}

pub fn true_false(id: u64, minutes: Option<u32>) -> Question {
    Question::true_false(qid(id), format!("Statement {id}"), true, 1)
        .unwrap()
        .with_time_limit(minutes.map(TimeLimit::from_minutes))
}

pub fn quiz(global_minutes: Option<u32>, questions: Vec<Question>) -> Arc<Quiz> {
    let total = questions.iter().map(Question::points).sum();
    Arc::new(
        Quiz::new(QuizId::new(1), "Timed quiz", total, questions)
            .unwrap()
            .with_time_limit(global_minutes.map(TimeLimit::from_minutes)),
    )
}

pub fn session_with(
    quiz: Arc<Quiz>,
    submitter: &Arc<CountingSubmitter>,
    display: impl DisplaySurface + 'static,
) -> QuizSession {
    let submitter: Arc<dyn QuizSubmitter> = submitter.clone();
    let mut session = QuizSession::new(quiz, submitter, Box::new(display));
    session.start();
    session
}

pub fn session(quiz: Arc<Quiz>, submitter: &Arc<CountingSubmitter>) -> QuizSession {
    session_with(quiz, submitter, RecordingDisplay::new())
}

/// Handle every countdown event queued so far, returning the last submit outcome.
pub async fn pump(session: &mut QuizSession) -> Option<SubmitOutcome> {
    let mut outcome = None;
    while let Some(event) = session.try_next_timer_event() {
        if let Ok(Some(result)) = session.handle_timer_event(event).await {
            outcome = Some(result);
        }
    }
    outcome
}
