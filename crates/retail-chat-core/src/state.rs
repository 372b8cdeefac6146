//! UI-agnostic conversation state
//!
//! The [`Conversation`] is the single source of truth a front end renders: an
//! append-only list of [`ChatMessage`]s plus the [`SubmissionState`] that
//! decides whether the typing placeholder is shown. Every change bumps a
//! revision published on a `watch` channel so views know when to redraw and
//! scroll to the newest row.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::chart::ChartDescriptor;
use crate::reply::ChatReply;

pub const GREETING: &str =
    "Hello! I can help you analyze retail transaction data. Try one of these:";

pub const STARTER_SUGGESTIONS: [&str; 4] = [
    "What has customer 109318 purchased?",
    "Which stores sell product A?",
    "What is the total revenue by category?",
    "Compare product A vs product B",
];

/// Shown in place of a reply whenever the answering service fails.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// Position of a message in the transcript. Stable because the log only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub usize);

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A chat message in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chart_data: Vec<ChartDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ChatMessage {
    fn new(id: MessageId, role: ChatRole, content: String) -> Self {
        Self {
            id,
            role,
            content,
            source_data: None,
            intent: None,
            chart_data: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    AwaitingReply,
}

pub struct Conversation {
    messages: Vec<ChatMessage>,
    state: SubmissionState,
    revision: watch::Sender<u64>,
}

impl Conversation {
    /// A conversation seeded with the standard greeting and starter questions.
    pub fn new() -> Self {
        Self::with_greeting(GREETING, STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_greeting(greeting: &str, suggestions: Vec<String>) -> Self {
        let (revision, _) = watch::channel(0);
        let mut greeting = ChatMessage::new(MessageId(0), ChatRole::Assistant, greeting.to_string());
        greeting.suggestions = suggestions;

        Self {
            messages: vec![greeting],
            state: SubmissionState::Idle,
            revision,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.get(id.0)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == SubmissionState::AwaitingReply
    }

    /// Whether the trailing typing placeholder belongs after the last message.
    pub fn show_placeholder(&self) -> bool {
        self.is_awaiting()
    }

    /// Suggestions offered by the greeting.
    pub fn suggestions(&self) -> &[String] {
        self.messages
            .first()
            .map(|m| m.suggestions.as_slice())
            .unwrap_or_default()
    }

    /// Receiver that observes every append and state toggle.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn push_user(&mut self, content: &str) -> MessageId {
        let id = self.next_id();
        self.append(ChatMessage::new(id, ChatRole::User, content.to_string()));
        id
    }

    pub fn push_reply(&mut self, reply: ChatReply) -> MessageId {
        let id = self.next_id();
        let mut message = ChatMessage::new(id, ChatRole::Assistant, reply.response);
        message.source_data = reply.source_data;
        message.intent = reply.intent;
        message.chart_data = reply.chart_data.unwrap_or_default();
        self.append(message);
        id
    }

    pub fn push_fallback(&mut self) -> MessageId {
        let id = self.next_id();
        self.append(ChatMessage::new(id, ChatRole::Assistant, FALLBACK_REPLY.to_string()));
        id
    }

    pub fn set_state(&mut self, state: SubmissionState) {
        if self.state != state {
            self.state = state;
            self.bump();
        }
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.messages.len())
    }

    fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);

        let greeting = &conversation.messages()[0];
        assert_eq!(greeting.role, ChatRole::Assistant);
        assert_eq!(greeting.content, GREETING);
        assert_eq!(conversation.suggestions().len(), 4);
        assert_eq!(conversation.state(), SubmissionState::Idle);
        assert!(!conversation.show_placeholder());
    }

    #[test]
    fn test_ids_follow_positions() {
        let mut conversation = Conversation::new();
        let user = conversation.push_user("hello");
        let reply = conversation.push_reply(ChatReply::new("hi"));

        assert_eq!(user, MessageId(1));
        assert_eq!(reply, MessageId(2));
        assert_eq!(conversation.get(reply).map(|m| m.content.as_str()), Some("hi"));
    }

    #[test]
    fn test_reply_fields_carried_over() {
        let mut conversation = Conversation::new();
        let id = conversation.push_reply(
            ChatReply::new("Revenue breakdown here.")
                .with_source_data("Books: 1200")
                .with_intent("business_metric"),
        );

        let message = conversation.get(id).unwrap();
        assert!(message.is_assistant());
        assert_eq!(message.source_data.as_deref(), Some("Books: 1200"));
        assert_eq!(message.intent.as_deref(), Some("business_metric"));
        assert!(message.chart_data.is_empty());
    }

    #[test]
    fn test_fallback_has_no_extras() {
        let mut conversation = Conversation::new();
        let id = conversation.push_fallback();
        let message = conversation.get(id).unwrap();

        assert_eq!(message.content, FALLBACK_REPLY);
        assert!(message.source_data.is_none());
        assert!(message.intent.is_none());
        assert!(message.chart_data.is_empty());
    }

    #[test]
    fn test_every_change_is_published() {
        let mut conversation = Conversation::new();
        let mut rx = conversation.subscribe();
        assert!(!rx.has_changed().unwrap());

        conversation.push_user("q");
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        conversation.set_state(SubmissionState::AwaitingReply);
        assert!(rx.has_changed().unwrap());
        assert!(conversation.show_placeholder());
        rx.borrow_and_update();

        // Setting the same state again is not a change
        conversation.set_state(SubmissionState::AwaitingReply);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), 2);
    }
}
