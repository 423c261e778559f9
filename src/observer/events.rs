//! @acp:module "Interaction Events"
//! @acp:summary "Typed live interaction events fed to the context observer"
//! @acp:domain personalization
//! @acp:layer types

use serde::{Deserialize, Serialize};

/// One interaction on the page. `at_ms` is milliseconds since session start.
///
/// Serialized with a `type` tag so event logs can be replayed from JSON lines:
/// `{"type":"click","target":"Add to cart","atMs":2400}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InteractionEvent {
    /// Vertical scroll position sample in pixels
    Scroll { position: f64, at_ms: u64 },
    Click { target: String, at_ms: u64 },
    HoverStart { target: String, at_ms: u64 },
    HoverEnd { target: String, at_ms: u64 },
    /// A section or element crossed into the viewport
    Visible { target: String, at_ms: u64 },
}

impl InteractionEvent {
    pub fn at_ms(&self) -> u64 {
        match self {
            InteractionEvent::Scroll { at_ms, .. }
            | InteractionEvent::Click { at_ms, .. }
            | InteractionEvent::HoverStart { at_ms, .. }
            | InteractionEvent::HoverEnd { at_ms, .. }
            | InteractionEvent::Visible { at_ms, .. } => *at_ms,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InteractionEvent::Scroll { .. } => "scroll",
            InteractionEvent::Click { .. } => "click",
            InteractionEvent::HoverStart { .. } => "hover_start",
            InteractionEvent::HoverEnd { .. } => "hover_end",
            InteractionEvent::Visible { .. } => "visible",
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            InteractionEvent::Scroll { .. } => None,
            InteractionEvent::Click { target, .. }
            | InteractionEvent::HoverStart { target, .. }
            | InteractionEvent::HoverEnd { target, .. }
            | InteractionEvent::Visible { target, .. } => Some(target),
        }
    }

    /// Parse a JSON-lines event log, skipping blank lines and `#` comments
    pub fn parse_lines(input: &str) -> crate::Result<Vec<InteractionEvent>> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let event: InteractionEvent =
            serde_json::from_str(r#"{"type":"hover_end","target":"Specs table","atMs":4100}"#).unwrap();
        assert_eq!(
            event,
            InteractionEvent::HoverEnd {
                target: "Specs table".to_string(),
                at_ms: 4100
            }
        );
        assert_eq!(event.kind(), "hover_end");
        assert_eq!(event.target(), Some("Specs table"));
    }

    #[test]
    fn test_parse_lines_skips_comments() {
        let log = "# replay\n{\"type\":\"scroll\",\"position\":120.0,\"atMs\":2100}\n\n{\"type\":\"click\",\"target\":\"Buy\",\"atMs\":2500}\n";
        let events = InteractionEvent::parse_lines(log).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at_ms(), 2100);
    }

    #[test]
    fn test_parse_lines_rejects_unknown_type() {
        assert!(InteractionEvent::parse_lines(r#"{"type":"swipe","atMs":1}"#).is_err());
    }
}
