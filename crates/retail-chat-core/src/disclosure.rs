//! Reveal state for the source data backing an assistant answer.

use std::collections::HashMap;

use crate::state::{ChatMessage, MessageId};

/// Returned by the service when the question needed no data lookup.
pub const NO_DATA_SENTINEL: &str = "No specific data retrieval needed for this query.";

/// Whether `source_data` is worth a disclosure control.
pub fn offers_disclosure(source_data: Option<&str>) -> bool {
    match source_data {
        Some(data) => !data.is_empty() && data != NO_DATA_SENTINEL,
        None => false,
    }
}

/// Display label for an intent tag. Unknown tags are shown as they are.
pub fn intent_label(intent: &str) -> &str {
    match intent {
        "customer_query" => "👤 Customer Query",
        "product_query" => "📦 Product Query",
        "business_metric" => "📊 Business Metric",
        "comparison" => "⚖️ Comparison",
        "general" => "💬 General",
        other => other,
    }
}

impl ChatMessage {
    /// Source data to disclose, if this message offers any.
    pub fn disclosable_source(&self) -> Option<&str> {
        let data = self.source_data.as_deref();
        if self.is_assistant() && offers_disclosure(data) {
            data
        } else {
            None
        }
    }

    pub fn intent_label(&self) -> Option<&str> {
        self.intent.as_deref().map(intent_label)
    }
}

/// Per-message expanded flags, scoped to one transcript view.
#[derive(Debug, Default, Clone)]
pub struct DisclosureState {
    expanded: HashMap<MessageId, bool>,
}

impl DisclosureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: MessageId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// Flip the flag for `message`. Messages without a disclosure control are
    /// left alone and yield `None`.
    pub fn toggle(&mut self, message: &ChatMessage) -> Option<bool> {
        message.disclosable_source()?;
        let flag = self.expanded.entry(message.id).or_insert(false);
        *flag = !*flag;
        Some(*flag)
    }
}
