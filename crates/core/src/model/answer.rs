use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer sheet is sealed")]
    Sealed,
}

/// The selected choice for one question, as sent to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub answer_text: String,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: QuestionId, answer_text: impl Into<String>) -> Self {
        Self {
            question_id,
            answer_text: answer_text.into(),
        }
    }
}

/// Collects at most one answer per question.
///
/// Answers keep the position of the first write for their question; a later
/// write replaces the text in place. Whether a question may be written at all
/// is decided by the caller. The sheet only refuses writes once sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: Vec<Answer>,
    sealed: bool,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace the answer for `question_id`.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Sealed` after `seal` has been called.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        text: impl Into<String>,
    ) -> Result<(), AnswerError> {
        if self.sealed {
            return Err(AnswerError::Sealed);
        }

        let text = text.into();
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            Some(existing) => existing.answer_text = text,
            None => self.answers.push(Answer::new(question_id, text)),
        }
        Ok(())
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.answer_text.as_str())
    }

    /// Stop accepting writes. Existing answers stay readable.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_replaces_earlier() {
        let mut sheet = AnswerSheet::new();
        let q1 = QuestionId::new(1);
        sheet.set_answer(q1, "a").unwrap();
        sheet.set_answer(QuestionId::new(2), "True").unwrap();
        sheet.set_answer(q1, "c").unwrap();

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.answer_for(q1), Some("c"));
        // first-write position is kept
        assert_eq!(sheet.answers()[0].question_id, q1);
    }

    #[test]
    fn sealed_sheet_rejects_writes_but_keeps_answers() {
        let mut sheet = AnswerSheet::new();
        let q1 = QuestionId::new(1);
        sheet.set_answer(q1, "a").unwrap();
        sheet.seal();

        assert_eq!(sheet.set_answer(q1, "b"), Err(AnswerError::Sealed));
        assert_eq!(
            sheet.set_answer(QuestionId::new(2), "x"),
            Err(AnswerError::Sealed)
        );
        assert_eq!(sheet.answers(), [Answer::new(q1, "a")]);
    }

    #[test]
    fn answer_serializes_with_wire_names() {
        let json = serde_json::to_value(Answer::new(QuestionId::new(4), "False")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "question_id": 4, "answer_text": "False" })
        );
    }
}
