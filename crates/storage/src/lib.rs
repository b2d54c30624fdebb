#![forbid(unsafe_code)]

pub mod records;
pub mod repository;

pub use records::{QuestionRecord, QuizRecord, parse_quiz_json};
pub use repository::{
    AttemptRepository, InMemoryRepository, QuizRepository, Storage, StorageError,
};
