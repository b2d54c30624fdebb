use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::model::{Answer, Attempt, AttemptAnswer, AttemptId, QuestionId, QuizId};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::repository::AttemptRepository;

use crate::error::SubmissionError;

/// The remote side that grades a submission and returns the attempt record.
#[async_trait]
pub trait QuizSubmitter: Send + Sync {
    /// # Errors
    ///
    /// Returns `SubmissionError` for transport or validation failures.
    async fn submit(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
    ) -> Result<Attempt, SubmissionError>;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct HttpSubmitterConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl HttpSubmitterConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_SUBMIT_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let token = env::var("QUIZ_SUBMIT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self { base_url, token })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn submit_url(&self, quiz_id: QuizId) -> String {
        format!("{}/submit_answers/{quiz_id}", self.base())
    }

    fn results_url(&self, attempt_id: AttemptId) -> String {
        format!("{}/quiz_results/{attempt_id}", self.base())
    }
}

/// Talks to the LMS backend.
///
/// A submission is a POST to `submit_answers/{quiz_id}` answered with
/// `{"id": attempt_id}`, followed by a GET of `quiz_results/{attempt_id}` for
/// the graded attempt. Once the server has accepted a submission its receipt
/// is kept, so a retry after a failed results fetch only fetches again.
#[derive(Clone)]
pub struct HttpSubmitter {
    client: Client,
    config: Option<HttpSubmitterConfig>,
    receipts: Arc<Mutex<HashMap<QuizId, (Vec<Answer>, AttemptId)>>>,
}

impl HttpSubmitter {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HttpSubmitterConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<HttpSubmitterConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
            receipts: Arc::default(),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn accepted(&self, quiz_id: QuizId, answers: &[Answer]) -> Option<AttemptId> {
        let receipts = self.receipts.lock().ok()?;
        receipts
            .get(&quiz_id)
            .filter(|(sent, _)| sent.as_slice() == answers)
            .map(|(_, attempt_id)| *attempt_id)
    }

    fn remember(&self, quiz_id: QuizId, answers: &[Answer], attempt_id: AttemptId) {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.insert(quiz_id, (answers.to_vec(), attempt_id));
        }
    }

    fn forget(&self, quiz_id: QuizId) {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.remove(&quiz_id);
        }
    }

    async fn post_answers(
        &self,
        config: &HttpSubmitterConfig,
        quiz_id: QuizId,
        answers: &[Answer],
    ) -> Result<AttemptId, SubmissionError> {
        let request = self
            .client
            .post(config.submit_url(quiz_id))
            .json(&SubmitRequest { answers });
        let response = authorized(config, request).send().await?;
        if !response.status().is_success() {
            return Err(SubmissionError::HttpStatus(response.status()));
        }

        // The attempt exists server-side from here on.
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::UnreadableReceipt(e.to_string()))?;
        let receipt: SubmitReceipt = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::UnreadableReceipt(e.to_string()))?;
        Ok(receipt.id)
    }

    async fn fetch_results(
        &self,
        config: &HttpSubmitterConfig,
        quiz_id: QuizId,
        attempt_id: AttemptId,
    ) -> Result<Attempt, SubmissionError> {
        let request = self.client.get(config.results_url(attempt_id));
        let response = authorized(config, request).send().await?;
        if !response.status().is_success() {
            return Err(SubmissionError::HttpStatus(response.status()));
        }
        let results: ResultsResponse = response.json().await?;
        Ok(results.into_attempt(quiz_id))
    }
}

fn authorized(config: &HttpSubmitterConfig, request: RequestBuilder) -> RequestBuilder {
    match &config.token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    answers: &'a [Answer],
}

#[derive(Debug, Deserialize)]
struct SubmitReceipt {
    id: AttemptId,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    attempt: ResultsAttempt,
    #[serde(default)]
    answers: Vec<ResultsAnswer>,
}

#[derive(Debug, Deserialize)]
struct ResultsAttempt {
    id: AttemptId,
    taken_at: DateTime<Utc>,
    #[serde(default)]
    score: u32,
}

#[derive(Debug, Deserialize)]
struct ResultsAnswer {
    question_id: QuestionId,
    answer_text: Option<String>,
    is_correct: Option<bool>,
}

impl ResultsResponse {
    /// The results payload carries no quiz id; the caller supplies it.
    fn into_attempt(self, quiz_id: QuizId) -> Attempt {
        Attempt {
            id: self.attempt.id,
            quiz_id,
            score: self.attempt.score,
            taken_at: self.attempt.taken_at,
            answers: self
                .answers
                .into_iter()
                .map(|a| AttemptAnswer {
                    question_id: a.question_id,
                    answer_text: a.answer_text.unwrap_or_default(),
                    is_correct: a.is_correct,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl QuizSubmitter for HttpSubmitter {
    async fn submit(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
    ) -> Result<Attempt, SubmissionError> {
        let config = self.config.as_ref().ok_or(SubmissionError::Disabled)?;

        let attempt_id = match self.accepted(quiz_id, answers) {
            Some(attempt_id) => {
                log::debug!("attempt {attempt_id} already accepted, fetching results again");
                attempt_id
            }
            None => {
                let attempt_id = self.post_answers(config, quiz_id, answers).await?;
                self.remember(quiz_id, answers, attempt_id);
                attempt_id
            }
        };

        let attempt = self.fetch_results(config, quiz_id, attempt_id).await?;
        self.forget(quiz_id);
        Ok(attempt)
    }
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Submits straight into an `AttemptRepository`.
#[derive(Clone)]
pub struct RepositorySubmitter {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
}

impl RepositorySubmitter {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { clock, attempts }
    }
}

#[async_trait]
impl QuizSubmitter for RepositorySubmitter {
    async fn submit(
        &self,
        quiz_id: QuizId,
        answers: &[Answer],
    ) -> Result<Attempt, SubmissionError> {
        Ok(self
            .attempts
            .record_attempt(quiz_id, answers, self.clock.now())
            .await?)
    }
}
