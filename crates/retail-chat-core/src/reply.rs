//! The reply payload returned by the answering service for one question.

use serde::{Deserialize, Serialize};

use crate::chart::{self, ChartDescriptor};

/// Body of a successful `/api/chat` response.
///
/// Only `response` is guaranteed. Missing optional fields are simply omitted
/// downstream; `chart_data` may also arrive as `null`, and descriptors that
/// do not decode are dropped without failing the reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(
        default,
        deserialize_with = "chart::deserialize_descriptors",
        skip_serializing_if = "Option::is_none"
    )]
    pub chart_data: Option<Vec<ChartDescriptor>>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    pub fn with_source_data(mut self, source_data: impl Into<String>) -> Self {
        self.source_data = Some(source_data.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_charts(mut self, charts: Vec<ChartDescriptor>) -> Self {
        self.chart_data = Some(charts);
        self
    }
}

/// Body sent to the answering service.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_reply() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response": "Please enter a question about retail data."}"#)
                .unwrap();
        assert_eq!(reply.response, "Please enter a question about retail data.");
        assert!(reply.source_data.is_none());
        assert!(reply.intent.is_none());
        assert!(reply.chart_data.is_none());
    }

    #[test]
    fn test_full_reply_with_null_charts() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "response": "Customer 109318 bought 3 items.",
                "source_data": "Customer 109318: 3 transactions",
                "intent": "customer_query",
                "chart_data": null
            }"#,
        )
        .unwrap();
        assert_eq!(reply.intent.as_deref(), Some("customer_query"));
        assert!(reply.chart_data.is_none());
    }

    #[test]
    fn test_reply_tolerates_unknown_chart_kind() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "response": "ok",
                "chart_data": [
                    {"type": "heatmap", "title": "Later", "data": [{"cells": [1, 2]}]},
                    {"type": "pie", "title": "Payment Methods",
                     "data": [{"name": "Cash", "value": 3}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(reply.chart_data.map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_odd_charts_keep_the_answer() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "response": "Revenue grew in 2024.",
                "source_data": "2023: 900, 2024: 1200",
                "intent": "business_metric",
                "chart_data": [
                    {"type": "heatmap", "title": "Grid", "data": [[1, 2], [3, 4]]},
                    {"type": "bar", "title": "Revenue by Year",
                     "data": [{"name": 2023, "value": 900}, {"name": 2024, "value": 1200}],
                     "dataKey": "value"},
                    {"title": "Untyped", "data": []}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(reply.response, "Revenue grew in 2024.");
        assert_eq!(reply.intent.as_deref(), Some("business_metric"));

        let charts = reply.chart_data.unwrap();
        assert_eq!(charts.len(), 2);
        let rendered = chart::renderable(&charts);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].title(), "Revenue by Year");
        assert_eq!(rendered[0].bars()[1].label, "2024");
    }

    #[test]
    fn test_non_list_chart_data_reads_as_none() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response": "ok", "chart_data": {"type": "bar"}}"#).unwrap();
        assert!(reply.chart_data.is_none());
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(ChatRequest { message: "hi" }).unwrap();
        assert_eq!(body, serde_json::json!({"message": "hi"}));
    }
}
