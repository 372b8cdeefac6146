//! The answering service the controller consults for every question.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::reply::ChatReply;

pub use http::HttpAnsweringService;

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Answering service returned status {0}")]
    Status(u16),

    #[error("Invalid reply payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Reply task ended early: {0}")]
    Aborted(String),
}

/// Anything that can turn a question into a [`ChatReply`].
#[async_trait]
pub trait AnsweringService: Send + Sync {
    async fn answer(&self, question: &str) -> Result<ChatReply, AnswerError>;
}

/// Run one `answer` call, treating expiry of `limit` as a failure.
pub async fn answer_within(
    service: &dyn AnsweringService,
    question: &str,
    limit: Duration,
) -> Result<ChatReply, AnswerError> {
    match tokio::time::timeout(limit, service.answer(question)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AnswerError::Timeout(limit)),
    }
}
