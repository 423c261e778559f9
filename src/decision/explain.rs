//! @acp:module "Decision Explanation"
//! @acp:summary "Human-readable account of why a template and copy were chosen"
//! @acp:domain personalization
//! @acp:layer logic

use crate::scoring::{IntentResult, SCORE_FLOOR};
use crate::signals::{Intent, Signal};

/// How the template was picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChoice {
    Matched { template_id: String },
    Fallback { template_id: String },
}

/// How the copy was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChoice {
    Matched,
    DefaultEntry,
    Minimal,
}

/// Sentence order: signals, then template reason, then content reason.
pub fn build_explanation(
    result: &IntentResult,
    template: &TemplateChoice,
    content: ContentChoice,
) -> String {
    let mut parts = Vec::with_capacity(3);
    parts.push(signal_sentence(result));

    parts.push(match template {
        TemplateChoice::Matched { template_id } => format!(
            "Template '{}' matches intent {}.",
            template_id, result.intent
        ),
        TemplateChoice::Fallback { template_id } => format!(
            "No template matches intent {}; using default template '{}'.",
            result.intent, template_id
        ),
    });

    parts.push(match content {
        ContentChoice::Matched => format!("Content from the {} bundle.", result.intent),
        ContentChoice::DefaultEntry => format!(
            "No content for intent {}; using DEFAULT content.",
            result.intent
        ),
        ContentChoice::Minimal => "No catalog content available; using built-in copy.".to_string(),
    });

    parts.join(" ")
}

fn signal_sentence(result: &IntentResult) -> String {
    let percent = (result.confidence * 100.0).round() as i64;

    if result.signals.is_empty() {
        return format!(
            "No personalization signals detected; showing DEFAULT content ({}% confidence).",
            percent
        );
    }

    let listed = describe_signals(&result.signals);
    let count = result.signals.len();
    let noun = if count == 1 { "signal" } else { "signals" };

    if result.intent == Intent::Default {
        // Evidence existed but nothing cleared the floor; it is still listed
        format!(
            "No intent reached the {:.1} score floor, so DEFAULT was chosen ({}% confidence). {} {} considered: {}.",
            SCORE_FLOOR, percent, count, noun, listed
        )
    } else {
        format!(
            "Intent {} detected with {}% confidence from {} {}: {}.",
            result.intent, percent, count, noun, listed
        )
    }
}

fn describe_signals(signals: &[Signal]) -> String {
    signals
        .iter()
        .map(|s| {
            format!(
                "{} {}='{}' -> {} ({:.2})",
                s.source_type, s.key, s.raw_value, s.detected_intent, s.weight
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
