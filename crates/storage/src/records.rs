//! Serialized shape of quiz definitions.

use quiz_core::TimeLimit;
use quiz_core::model::{Question, QuestionId, QuestionKind, Quiz, QuizId};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// Persisted/wire shape for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u64,
    pub question_point: u32,
    #[serde(default)]
    pub question_time_limit: Option<u32>,
    pub question_text: String,
    pub question_type: String,
    pub correct_answer: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().value(),
            question_point: question.points(),
            question_time_limit: question.time_limit().map(TimeLimit::minutes),
            question_text: question.text().to_owned(),
            question_type: question.kind().code().to_owned(),
            correct_answer: question.correct_answer().to_owned(),
            choices: Some(question.choices().to_vec()),
        }
    }

    /// Convert the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for unknown question types or
    /// definitions the domain rejects.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let id = QuestionId::new(self.id);
        let kind = QuestionKind::from_code(&self.question_type).ok_or_else(|| {
            StorageError::Serialization(format!(
                "question {id}: unknown question type {:?}",
                self.question_type
            ))
        })?;

        let question = match kind {
            QuestionKind::MultipleChoice => Question::multiple_choice(
                id,
                self.question_text,
                self.choices.unwrap_or_default(),
                self.correct_answer,
                self.question_point,
            ),
            QuestionKind::TrueFalse => Question::true_false(
                id,
                self.question_text,
                self.correct_answer.trim().eq_ignore_ascii_case("true"),
                self.question_point,
            ),
        }
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(question.with_time_limit(self.question_time_limit.map(TimeLimit::from_minutes)))
    }
}

/// Persisted/wire shape for a quiz with its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub id: u64,
    pub quiz_title: String,
    #[serde(default)]
    pub quiz_description: String,
    pub total_mark: u32,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub attempts_allowed: Option<u32>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl QuizRecord {
    #[must_use]
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id().value(),
            quiz_title: quiz.title().to_owned(),
            quiz_description: quiz.description().to_owned(),
            total_mark: quiz.total_mark(),
            time_limit: quiz.time_limit().map(TimeLimit::minutes),
            attempts_allowed: quiz.attempts_allowed(),
            questions: quiz
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
        }
    }

    /// Convert the record back into a domain `Quiz`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any part fails validation.
    pub fn into_quiz(self) -> Result<Quiz, StorageError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        Quiz::new(QuizId::new(self.id), self.quiz_title, self.total_mark, questions)
            .map(|quiz| {
                quiz.with_attempts_allowed(self.attempts_allowed)
                    .with_description(self.quiz_description)
                    .with_time_limit(self.time_limit.map(TimeLimit::from_minutes))
            })
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Parse a quiz definition from JSON text.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON or invalid quizzes.
pub fn parse_quiz_json(raw: &str) -> Result<Quiz, StorageError> {
    let record: QuizRecord =
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
    record.into_quiz()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": 12,
        "quiz_title": "Rust basics",
        "quiz_description": "Ownership and borrowing",
        "total_mark": 3,
        "time_limit": 10,
        "attempts_allowed": 2,
        "questions": [
            {
                "id": 1,
                "question_point": 2,
                "question_text": "Which keyword moves a closure's captures?",
                "question_type": "MCQ",
                "correct_answer": "move",
                "choices": ["ref", "move", "static"]
            },
            {
                "id": 2,
                "question_point": 1,
                "question_time_limit": 1,
                "question_text": "Borrowed references can outlive their owner.",
                "question_type": "TF",
                "correct_answer": "False",
                "choices": null
            }
        ]
    }"#;

    #[test]
    fn parses_original_quiz_shape() {
        let quiz = parse_quiz_json(SAMPLE).unwrap();
        assert_eq!(quiz.id(), QuizId::new(12));
        assert_eq!(quiz.time_limit(), Some(TimeLimit::from_minutes(10)));
        assert_eq!(quiz.attempts_allowed(), Some(2));
        assert_eq!(quiz.questions().len(), 2);

        let tf = quiz.question(QuestionId::new(2)).unwrap();
        assert_eq!(tf.kind(), QuestionKind::TrueFalse);
        assert_eq!(tf.choices(), ["True", "False"]);
        assert_eq!(tf.correct_answer(), "False");
        assert_eq!(tf.time_limit(), Some(TimeLimit::from_minutes(1)));
    }

    #[test]
    fn record_survives_conversion() {
        let quiz = parse_quiz_json(SAMPLE).unwrap();
        let again = QuizRecord::from_quiz(&quiz).into_quiz().unwrap();
        assert_eq!(quiz, again);
    }

    #[test]
    fn unknown_question_type_is_a_serialization_error() {
        let raw = SAMPLE.replace("\"MCQ\"", "\"ESSAY\"");
        let err = parse_quiz_json(&raw).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(msg) if msg.contains("ESSAY")));
    }

    #[test]
    fn zero_attempts_allowed_loads() {
        let raw = SAMPLE.replace("\"attempts_allowed\": 2", "\"attempts_allowed\": 0");
        let quiz = parse_quiz_json(&raw).unwrap();
        assert_eq!(quiz.attempts_allowed(), Some(0));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_quiz_json("{\"id\": 1"),
            Err(StorageError::Serialization(_))
        ));
    }
}
