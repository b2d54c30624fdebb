use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::time::TimeLimit;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("question {0} has no text")]
    EmptyQuestionText(QuestionId),

    #[error("multiple choice question {id} needs at least two choices, got {len}")]
    TooFewChoices { id: QuestionId, len: usize },

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Wire code used by quiz definitions ("MCQ" / "TF").
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MCQ",
            QuestionKind::TrueFalse => "TF",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "MCQ" => Some(Self::MultipleChoice),
            "TF" => Some(Self::TrueFalse),
            _ => None,
        }
    }
}

pub const TRUE_FALSE_CHOICES: [&str; 2] = ["True", "False"];

/// A single quiz question.
///
/// The correct answer travels with the definition but the session engine never
/// reads it; it is only used when grading or rendering results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    kind: QuestionKind,
    choices: Vec<String>,
    correct_answer: String,
    time_limit: Option<TimeLimit>,
    points: u32,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionText` or `QuizError::TooFewChoices`.
    pub fn multiple_choice(
        id: QuestionId,
        text: impl Into<String>,
        choices: Vec<String>,
        correct_answer: impl Into<String>,
        points: u32,
    ) -> Result<Self, QuizError> {
        let text = normalize_text(id, text.into())?;
        let choices: Vec<String> = choices
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if choices.len() < 2 {
            return Err(QuizError::TooFewChoices {
                id,
                len: choices.len(),
            });
        }

        Ok(Self {
            id,
            text,
            kind: QuestionKind::MultipleChoice,
            choices,
            correct_answer: correct_answer.into(),
            time_limit: None,
            points,
        })
    }

    /// True/false questions always offer exactly `True` and `False`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionText` if the text is blank.
    pub fn true_false(
        id: QuestionId,
        text: impl Into<String>,
        correct: bool,
        points: u32,
    ) -> Result<Self, QuizError> {
        let text = normalize_text(id, text.into())?;
        let correct_answer = if correct {
            TRUE_FALSE_CHOICES[0]
        } else {
            TRUE_FALSE_CHOICES[1]
        };

        Ok(Self {
            id,
            text,
            kind: QuestionKind::TrueFalse,
            choices: TRUE_FALSE_CHOICES.iter().map(|c| (*c).to_string()).collect(),
            correct_answer: correct_answer.to_string(),
            time_limit: None,
            points,
        })
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<TimeLimit>) -> Self {
        self.time_limit = limit;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<TimeLimit> {
        self.time_limit
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit.is_some()
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Exact comparison against the stored correct answer.
    #[must_use]
    pub fn is_correct(&self, answer_text: &str) -> bool {
        answer_text == self.correct_answer
    }
}

fn normalize_text(id: QuestionId, text: String) -> Result<String, QuizError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QuizError::EmptyQuestionText(id));
    }
    Ok(trimmed.to_string())
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz definition as fetched for a session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    total_mark: u32,
    time_limit: Option<TimeLimit>,
    attempts_allowed: Option<u32>,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` for a blank title and
    /// `QuizError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        total_mark: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id()));
            }
        }

        Ok(Self {
            id,
            title,
            description: String::new(),
            total_mark,
            time_limit: None,
            attempts_allowed: None,
            questions,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<TimeLimit>) -> Self {
        self.time_limit = limit;
        self
    }

    /// `None` leaves the quiz open to any number of attempts; `Some(0)` admits none.
    #[must_use]
    pub fn with_attempts_allowed(mut self, allowed: Option<u32>) -> Self {
        self.attempts_allowed = allowed;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn total_mark(&self) -> u32 {
        self.total_mark
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<TimeLimit> {
        self.time_limit
    }

    #[must_use]
    pub fn attempts_allowed(&self) -> Option<u32> {
        self.attempts_allowed
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
