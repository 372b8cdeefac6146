//! Turns typed questions into answering-service calls and reconciles the
//! outcome into the conversation.
//!
//! At most one call is outstanding: while the conversation is awaiting a reply
//! every new submission is refused rather than queued. Whatever happens to the
//! call (reply, error, timeout, panic, cancellation) the conversation goes back
//! to idle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::reply::ChatReply;
use crate::service::{answer_within, AnswerError, AnsweringService};
use crate::state::{Conversation, MessageId, SubmissionState};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Proof that a question was accepted and is owed exactly one reply.
#[derive(Debug)]
#[must_use = "an accepted question must be finished or the conversation stays busy"]
pub struct Ticket {
    question: String,
}

impl Ticket {
    pub fn question(&self) -> &str {
        &self.question
    }
}

/// A reply being computed on the runtime. Poll [`PendingReply::is_finished`]
/// from the event loop and hand the joined outcome to
/// [`SubmissionController::finish`].
pub struct PendingReply {
    ticket: Ticket,
    handle: JoinHandle<Result<ChatReply, AnswerError>>,
}

impl PendingReply {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> (Ticket, Result<ChatReply, AnswerError>) {
        let outcome = match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AnswerError::Aborted(e.to_string())),
        };
        (self.ticket, outcome)
    }
}

/// How a call to [`SubmissionController::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Empty text or a reply already pending; nothing changed.
    Rejected,
    Answered(MessageId),
    Failed(MessageId),
}

pub struct SubmissionController {
    conversation: Conversation,
    service: Arc<dyn AnsweringService>,
    timeout: Duration,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn AnsweringService>) -> Self {
        Self {
            conversation: Conversation::new(),
            service,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Validate `text` and, when accepted, record the user turn and mark the
    /// conversation busy.
    pub fn begin(&mut self, text: &str) -> Option<Ticket> {
        if text.trim().is_empty() {
            return None;
        }
        if self.conversation.is_awaiting() {
            tracing::debug!("reply pending, ignoring submission");
            return None;
        }

        self.conversation.push_user(text);
        self.conversation.set_state(SubmissionState::AwaitingReply);
        tracing::info!(chars = text.chars().count(), "question submitted");

        Some(Ticket {
            question: text.to_string(),
        })
    }

    /// Record the outcome for `ticket` and return to idle.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<ChatReply, AnswerError>,
    ) -> Submission {
        reconcile(&mut self.conversation, ticket, outcome)
    }

    /// Ask and wait for the reply in place.
    pub async fn submit(&mut self, text: &str) -> Submission {
        let Some(ticket) = self.begin(text) else {
            return Submission::Rejected;
        };

        let service = Arc::clone(&self.service);
        let limit = self.timeout;
        let guard = ReleaseOnDrop {
            conversation: &mut self.conversation,
        };

        let outcome = answer_within(service.as_ref(), ticket.question(), limit).await;
        reconcile(&mut *guard.conversation, ticket, outcome)
    }

    /// Ask without waiting: the call runs as a runtime task.
    pub fn spawn(&mut self, text: &str) -> Option<PendingReply> {
        let ticket = self.begin(text)?;

        let service = Arc::clone(&self.service);
        let question = ticket.question.clone();
        let limit = self.timeout;
        let handle =
            tokio::spawn(async move { answer_within(service.as_ref(), &question, limit).await });

        Some(PendingReply { ticket, handle })
    }
}

fn reconcile(
    conversation: &mut Conversation,
    _ticket: Ticket,
    outcome: Result<ChatReply, AnswerError>,
) -> Submission {
    let submission = match outcome {
        Ok(reply) => Submission::Answered(conversation.push_reply(reply)),
        Err(e) => {
            tracing::warn!(error = %e, "answering service failed");
            Submission::Failed(conversation.push_fallback())
        }
    };
    conversation.set_state(SubmissionState::Idle);
    submission
}

/// Returns the conversation to idle even when the awaiting future is dropped
/// or unwinds.
struct ReleaseOnDrop<'a> {
    conversation: &'a mut Conversation,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.conversation.set_state(SubmissionState::Idle);
    }
}
