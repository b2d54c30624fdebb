use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuestionId, QuizId};

/// Per-question line of a graded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: QuestionId,
    pub answer_text: String,
    #[serde(default)]
    pub is_correct: Option<bool>,
}

/// The record returned by the submission collaborator for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<AttemptAnswer>,
}

impl Attempt {
    /// Number of answers the grader marked correct.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count()
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&AttemptAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}
