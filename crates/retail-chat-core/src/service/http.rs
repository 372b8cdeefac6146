use async_trait::async_trait;
use reqwest::Client;

use super::{AnswerError, AnsweringService};
use crate::reply::{ChatReply, ChatRequest};

/// Client for the backend's `POST /api/chat` endpoint.
#[derive(Clone)]
pub struct HttpAnsweringService {
    client: Client,
    base_url: String,
}

impl HttpAnsweringService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn ask(&self, question: &str) -> Result<ChatReply, AnswerError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message: question })
            .send()
            .await?;

        // The backend sends an apology body with its 500s; any non-success is a failure.
        if !response.status().is_success() {
            return Err(AnswerError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let reply: ChatReply = serde_json::from_str(&body)?;
        Ok(reply)
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringService {
    async fn answer(&self, question: &str) -> Result<ChatReply, AnswerError> {
        self.ask(question).await
    }
}
