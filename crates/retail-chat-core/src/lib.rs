pub mod chart;
pub mod config;
pub mod controller;
pub mod disclosure;
pub mod reply;
pub mod service;
pub mod state;

// Re-export main types for convenience
pub use chart::{Chart, ChartDescriptor, ChartKind, Record, Rgb};
pub use config::Config;
pub use controller::{PendingReply, Submission, SubmissionController, Ticket};
pub use disclosure::{intent_label, offers_disclosure, DisclosureState, NO_DATA_SENTINEL};
pub use reply::ChatReply;
pub use service::{AnswerError, AnsweringService, HttpAnsweringService};
pub use state::{ChatMessage, ChatRole, Conversation, MessageId, SubmissionState};
