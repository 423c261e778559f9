//! @acp:module "Analytics"
//! @acp:summary "Structured analytics records and the sinks that receive them"
//! @acp:domain personalization
//! @acp:layer output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const DECISION_MADE: &str = "decision_made";
pub const IMPRESSION: &str = "impression";
pub const CTA_CLICK: &str = "cta_click";
pub const VARIANT_SWAP: &str = "variant_swap";
pub const BEHAVIORAL_REPERSONALIZATION: &str = "behavioral_repersonalization";
pub const AB_WINNER_DECLARED: &str = "ab_winner_declared";

/// One analytics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_name: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(event_name: impl Into<String>, data: Value) -> Self {
        Self {
            event_name: event_name.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of analytics records. Emitting never fails the caller.
pub trait AnalyticsSink: Send {
    fn emit(&mut self, event: AnalyticsEvent);
}

/// Forwards records to `tracing` under the `hero::analytics` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn emit(&mut self, event: AnalyticsEvent) {
        tracing::info!(
            target: "hero::analytics",
            event = %event.event_name,
            timestamp = %event.timestamp.to_rfc3339(),
            data = %event.data,
        );
    }
}

/// Collects records in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of recorded events, in emission order
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_name).collect()
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_name == event_name)
            .count()
    }
}

impl AnalyticsSink for MemorySink {
    fn emit(&mut self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.emit(AnalyticsEvent::new(IMPRESSION, json!({ "intent": "COMPARE" })));
        writer.emit(AnalyticsEvent::new(CTA_CLICK, json!({})));

        assert_eq!(sink.names(), vec![IMPRESSION, CTA_CLICK]);
        assert_eq!(sink.count(IMPRESSION), 1);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = AnalyticsEvent::new(DECISION_MADE, json!({ "sessionId": "s" }));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["eventName"], DECISION_MADE);
        assert_eq!(value["data"]["sessionId"], "s");
        assert!(value["timestamp"].is_string());
    }
}
