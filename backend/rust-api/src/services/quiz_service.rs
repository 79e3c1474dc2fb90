use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, TimeoutConfig};
use crate::error::{ApiError, StoreError};
use crate::identity::UserId;
use crate::llm::Generator;
use crate::metrics::{record_generator_fallback, record_quiz_outcome};
use crate::models::quiz::{ActionButton, Question, QuizState, QUESTIONS_PER_ROUND};
use crate::services::question_generation::{
    build_round, fallback_questions, parse_generated, quiz_generation_request, GeneratedQuestions,
    RoundQuestions,
};
use crate::store::{bounded, QuizStore};
use crate::utils::retry::{retry_with_policy, RetryPolicy};

const DB_TIMEOUT_MESSAGE: &str = "Database timeout - please try again later";

#[derive(Debug)]
pub enum RoundOutcome {
    Started {
        questions: RoundQuestions,
        attempts_left: u32,
    },
    /// The session has no attempts left. The round endpoint never resets it.
    Exhausted,
}

pub fn round_message(attempts_left: u32) -> String {
    format!(
        "You have {} chance(s) to get up to 50% off on our membership!",
        attempts_left
    )
}

pub const EXHAUSTED_MESSAGE: &str = "No attempts left. Please start a new listing.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Perfect,
    Retry { correct: usize, attempts_left: u32 },
    Failed { correct: usize },
}

impl SubmissionOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SubmissionOutcome::Perfect => "success",
            SubmissionOutcome::Retry { .. } => "retry",
            SubmissionOutcome::Failed { .. } => "failed",
        }
    }

    pub fn correct(&self) -> usize {
        match self {
            SubmissionOutcome::Perfect => QUESTIONS_PER_ROUND,
            SubmissionOutcome::Retry { correct, .. } | SubmissionOutcome::Failed { correct } => {
                *correct
            }
        }
    }

    pub fn score(&self) -> String {
        format!("{}/{}", self.correct(), QUESTIONS_PER_ROUND)
    }

    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Perfect => "Congratulations! You got all answers correct! Buy our membership now and get up to 50% off!".to_string(),
            SubmissionOutcome::Retry { correct, attempts_left } => format!(
                "You got {}/{} correct. {} chance(s) left. Try again!",
                correct, QUESTIONS_PER_ROUND, attempts_left
            ),
            SubmissionOutcome::Failed { correct } => format!(
                "You got {}/{} correct. No attempts left. Start a new listing to try again!",
                correct, QUESTIONS_PER_ROUND
            ),
        }
    }

    pub fn buttons(&self) -> Vec<ActionButton> {
        match self {
            SubmissionOutcome::Perfect => {
                vec![ActionButton::BUY_MEMBERSHIP, ActionButton::START_NEW_LISTING]
            }
            SubmissionOutcome::Retry { .. } => {
                vec![ActionButton::PLAY_AGAIN, ActionButton::START_NEW_LISTING]
            }
            SubmissionOutcome::Failed { .. } => vec![ActionButton::START_NEW_LISTING],
        }
    }

    /// Terminal outcomes end the session.
    pub fn ends_session(&self) -> bool {
        !matches!(self, SubmissionOutcome::Retry { .. })
    }

    fn metric_label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Perfect => "perfect",
            SubmissionOutcome::Retry { .. } => "retry",
            SubmissionOutcome::Failed { .. } => "failed",
        }
    }
}

/// Counts exact matches by position. Answers beyond the current questions are
/// ignored; questions without an answer count as wrong.
pub fn grade(questions: &[Question], answers: &[String]) -> usize {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| **answer == question.correct_answer)
        .count()
}

/// Applies one graded submission to the attempt counter. A perfect score wins
/// regardless of the attempts that remain.
pub fn decide(attempts_before: u32, correct: usize) -> SubmissionOutcome {
    let attempts_left = attempts_before.saturating_sub(1);
    if correct >= QUESTIONS_PER_ROUND {
        SubmissionOutcome::Perfect
    } else if attempts_left > 0 {
        SubmissionOutcome::Retry {
            correct,
            attempts_left,
        }
    } else {
        SubmissionOutcome::Failed { correct }
    }
}

pub struct QuizService {
    store: Arc<dyn QuizStore>,
    generator: Arc<dyn Generator>,
    timeouts: TimeoutConfig,
    retry: RetryPolicy,
    fallback_city: String,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>, generator: Arc<dyn Generator>, config: &Config) -> Self {
        Self {
            store,
            generator,
            timeouts: config.timeouts.clone(),
            retry: RetryPolicy::fixed(
                config.retry.max_attempts,
                Duration::from_millis(config.retry.history_delay_ms),
            ),
            fallback_city: config.quiz_fallback_city.clone(),
        }
    }

    pub async fn start_round(
        &self,
        user_id: &UserId,
        city: Option<&str>,
    ) -> Result<RoundOutcome, ApiError> {
        let requested_city = city.map(str::trim).filter(|c| !c.is_empty());
        let fresh = QuizState::new(
            user_id.as_str(),
            requested_city.unwrap_or(&self.fallback_city),
        );

        let session = self
            .with_retry("quiz.create", self.timeouts.write(), || {
                self.store.create_if_absent(&fresh)
            })
            .await
            .map_err(round_error)?;

        if session.attempts_left == 0 {
            tracing::info!("Quiz round refused for {}: no attempts left", user_id);
            record_quiz_outcome("exhausted");
            return Ok(RoundOutcome::Exhausted);
        }

        let city = requested_city.unwrap_or(&session.city).to_string();
        let questions = self.generate_questions(&city, &session.questions_asked).await;

        let mut questions_asked = session.questions_asked.clone();
        questions_asked.extend(questions.iter().map(|q| q.question.clone()));

        self.with_retry("quiz.save_round", self.timeouts.write(), || {
            self.store
                .save_round(user_id, &city, &questions_asked, &questions)
        })
        .await
        .map_err(round_error)?;

        tracing::info!(
            "Quiz round started for {} in {} ({} attempts left)",
            user_id,
            city,
            session.attempts_left
        );
        record_quiz_outcome("round_started");

        Ok(RoundOutcome::Started {
            questions,
            attempts_left: session.attempts_left,
        })
    }

    async fn generate_questions(&self, city: &str, questions_asked: &[String]) -> RoundQuestions {
        let request = quiz_generation_request(city, questions_asked);

        let generated = match self.generator.generate(request).await {
            Ok(raw) => {
                tracing::debug!("Raw quiz generator output: {}", raw);
                parse_generated(&raw)
            }
            Err(e) => {
                tracing::warn!("Quiz generator unavailable, serving fallback questions: {}", e);
                record_generator_fallback("unavailable");
                return fallback_questions(city);
            }
        };

        if let GeneratedQuestions::ParseFailure(reason) = &generated {
            tracing::warn!("Quiz generator output did not parse ({}), serving fallback questions", reason);
            record_generator_fallback("parse_failure");
        }

        build_round(&generated, city)
    }

    pub async fn submit(
        &self,
        user_id: &UserId,
        answers: &[String],
    ) -> Result<SubmissionOutcome, ApiError> {
        let session = self
            .with_retry("quiz.load", self.timeouts.read(), || self.store.load(user_id))
            .await
            .map_err(submit_error)?
            .ok_or_else(|| ApiError::not_found("No active quiz found"))?;

        if session.current_questions.is_empty() {
            return Err(ApiError::validation("No questions found for this quiz"));
        }

        let correct = grade(&session.current_questions, answers);
        let outcome = decide(session.attempts_left, correct);

        match &outcome {
            SubmissionOutcome::Retry { attempts_left, .. } => {
                let score = correct as u32;
                self.with_retry("quiz.record_submission", self.timeouts.write(), || {
                    self.store.record_submission(user_id, *attempts_left, score)
                })
                .await
                .map_err(submit_error)?;
            }
            SubmissionOutcome::Perfect | SubmissionOutcome::Failed { .. } => {
                self.with_retry("quiz.delete", self.timeouts.write(), || {
                    self.store.delete(user_id)
                })
                .await
                .map_err(submit_error)?;
            }
        }

        tracing::info!(
            "Quiz submission for {}: {} ({})",
            user_id,
            outcome.status(),
            outcome.score()
        );
        record_quiz_outcome(outcome.metric_label());

        Ok(outcome)
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        deadline: Duration,
        mut f: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        retry_with_policy(&self.retry, operation, || bounded(operation, deadline, f())).await
    }
}

fn round_error(err: StoreError) -> ApiError {
    ApiError::from_store(err, DB_TIMEOUT_MESSAGE, "Error generating quiz")
}

fn submit_error(err: StoreError) -> ApiError {
    ApiError::from_store(err, DB_TIMEOUT_MESSAGE, "Error submitting quiz answers")
}
