mod answer;
mod attempt;
mod ids;
mod quiz;
mod session;

pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId, SessionId};

pub use answer::{Answer, AnswerError, AnswerSheet};
pub use attempt::{Attempt, AttemptAnswer};
pub use quiz::{Question, QuestionKind, Quiz, QuizError, TRUE_FALSE_CHOICES};
pub use session::{SessionState, SubmitTrigger};
