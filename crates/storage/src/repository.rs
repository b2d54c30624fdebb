use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Attempt, AttemptAnswer, AttemptId, Quiz, QuizId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Source of quiz definitions.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist or update a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError>;
}

/// Record of submitted attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Grade and store a submission, returning the attempt record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is unknown.
    async fn record_attempt(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
        taken_at: DateTime<Utc>,
    ) -> Result<Attempt, StorageError>;

    /// Attempts for a quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts(&self, quiz_id: QuizId) -> Result<Vec<Attempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_attempts(&self, quiz_id: QuizId) -> Result<u32, StorageError> {
        let attempts = self.list_attempts(quiz_id).await?;
        u32::try_from(attempts.len()).map_err(|_| StorageError::Conflict)
    }
}

#[derive(Default)]
struct AttemptLog {
    next_id: u64,
    by_quiz: HashMap<QuizId, Vec<Attempt>>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Grading here is a stand-in for the remote grader: an answer is correct when
/// it matches the question's correct answer, and the score sums the points of
/// correct answers.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    attempts: Arc<Mutex<AttemptLog>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn record_attempt(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
        taken_at: DateTime<Utc>,
    ) -> Result<Attempt, StorageError> {
        let quiz = self.get_quiz(quiz_id).await?;

        let mut score = 0_u32;
        let graded = answers
            .iter()
            .map(|answer| {
                let is_correct = quiz
                    .question(answer.question_id)
                    .map(|q| (q.is_correct(&answer.answer_text), q.points()));
                if let Some((true, points)) = is_correct {
                    score = score.saturating_add(points);
                }
                AttemptAnswer {
                    question_id: answer.question_id,
                    answer_text: answer.answer_text.clone(),
                    is_correct: is_correct.map(|(correct, _)| correct),
                }
            })
            .collect();

        let mut log = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        log.next_id += 1;
        let attempt = Attempt {
            id: AttemptId::new(log.next_id),
            quiz_id,
            score,
            taken_at,
            answers: graded,
        };
        log.by_quiz.entry(quiz_id).or_default().push(attempt.clone());
        Ok(attempt)
    }

    async fn list_attempts(&self, quiz_id: QuizId) -> Result<Vec<Attempt>, StorageError> {
        let log = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(log.by_quiz.get(&quiz_id).cloned().unwrap_or_default())
    }
}

/// Aggregates quiz and attempt repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { quizzes, attempts }
    }
}
