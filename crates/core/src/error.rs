use thiserror::Error;

use crate::model::{AnswerError, QuizError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}
