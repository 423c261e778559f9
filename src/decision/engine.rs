//! @acp:module "Decision Engine"
//! @acp:summary "Map a scored intent to a template and content bundle from the catalog"
//! @acp:domain personalization
//! @acp:layer logic

use chrono::Utc;

use super::explain::{build_explanation, ContentChoice, TemplateChoice};
use super::types::{ContentBundle, DecisionResult};
use crate::catalog::{Badge, Catalog, ContentEntry};
use crate::scoring::IntentResult;
use crate::signals::Intent;

/// Resolve an intent result against the catalog.
///
/// Deterministic for a given input and catalog; only `timestamp` differs
/// between two calls.
pub fn decide(result: &IntentResult, catalog: &Catalog) -> DecisionResult {
    let template = select_template(result.intent, catalog);
    let (entry, content_choice) = select_content(result.intent, catalog);

    let content = ContentBundle {
        headline: entry.headline.clone(),
        subheadline: entry.subheadline.clone(),
        cta_text: entry.cta_text.clone(),
        cta_link: entry.cta_link.clone(),
        image: entry
            .image_key
            .as_ref()
            .and_then(|key| catalog.images.get(key))
            .cloned(),
    };
    let badges = resolve_badges(&entry, catalog);
    let explanation = build_explanation(result, &template, content_choice);

    let template_id = match template {
        TemplateChoice::Matched { template_id } | TemplateChoice::Fallback { template_id } => {
            template_id
        }
    };

    tracing::debug!(
        intent = %result.intent,
        confidence = result.confidence,
        template = %template_id,
        "Decision made"
    );

    DecisionResult {
        intent: result.intent,
        confidence: result.confidence,
        template_id,
        content,
        badges,
        explanation,
        signals_used: result.signals.clone(),
        raw_scores: result.scores,
        fallback_used: is_fallback(result),
        variant: None,
        timestamp: Utc::now(),
    }
}

/// DEFAULT reached with an empty signal list.
///
/// A DEFAULT that came from signals falling under the score floor is not a
/// fallback; the asymmetry is part of the contract.
pub fn is_fallback(result: &IntentResult) -> bool {
    result.intent == Intent::Default && result.signals.is_empty()
}

/// First template (in listing order) whose `matchIntents` contains the intent
fn select_template(intent: Intent, catalog: &Catalog) -> TemplateChoice {
    catalog
        .templates
        .iter()
        .find(|(_, template)| template.match_intents.contains(&intent))
        .map(|(id, _)| TemplateChoice::Matched {
            template_id: id.clone(),
        })
        .unwrap_or_else(|| TemplateChoice::Fallback {
            template_id: catalog.default_template.clone(),
        })
}

fn select_content(intent: Intent, catalog: &Catalog) -> (ContentEntry, ContentChoice) {
    if let Some(entry) = catalog.content.get(&intent) {
        return (entry.clone(), ContentChoice::Matched);
    }
    match catalog.content.get(&Intent::Default) {
        Some(entry) => (entry.clone(), ContentChoice::DefaultEntry),
        None => (Catalog::minimal_content(), ContentChoice::Minimal),
    }
}

/// Keys without a badge table entry are skipped
fn resolve_badges(entry: &ContentEntry, catalog: &Catalog) -> Vec<Badge> {
    entry
        .badge_keys
        .iter()
        .filter_map(|key| catalog.badges.get(key).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, Template, TemplateTable};
    use crate::scoring::{aggregate, override_result};
    use crate::signals::{ScoreVector, Signal, SourceType};

    fn catalog() -> Catalog {
        load_catalog(None, None)
    }

    fn empty_result() -> IntentResult {
        let agg = aggregate(&[]);
        IntentResult {
            intent: agg.intent,
            confidence: agg.confidence,
            scores: agg.scores,
            signals: vec![],
        }
    }

    #[test]
    fn test_no_signals_is_fallback() {
        let decision = decide(&empty_result(), &catalog());
        assert_eq!(decision.intent, Intent::Default);
        assert_eq!(decision.confidence, 1.0);
        assert!(decision.fallback_used);
        assert_eq!(decision.template_id, "default-hero");
    }

    #[test]
    fn test_floor_default_is_not_fallback() {
        let signal = Signal::new(SourceType::Time, "hour", "3", Intent::Budget, 0.05);
        let agg = aggregate(&[ScoreVector::from(std::slice::from_ref(&signal))]);
        let result = IntentResult {
            intent: agg.intent,
            confidence: agg.confidence,
            scores: agg.scores,
            signals: vec![signal],
        };
        let decision = decide(&result, &catalog());
        assert_eq!(decision.intent, Intent::Default);
        assert!(!decision.fallback_used);
    }

    #[test]
    fn test_template_and_content_for_intent() {
        let decision = decide(&override_result(Intent::Budget), &catalog());
        assert_eq!(decision.template_id, "value-budget");
        assert_eq!(decision.content.cta_link, "/deals");
        assert_eq!(decision.badges.len(), 2);
        assert!(decision.content.image.is_some());
    }

    #[test]
    fn test_missing_template_falls_back_to_default() {
        let mut catalog = catalog();
        catalog.templates.remove("comparison-grid");
        let decision = decide(&override_result(Intent::Compare), &catalog);
        assert_eq!(decision.template_id, catalog.default_template);
        assert!(decision.explanation.contains("No template matches intent COMPARE"));
    }

    #[test]
    fn test_first_matching_template_in_listing_order() {
        let mut catalog = catalog();
        let alt = Template {
            name: "Alt".to_string(),
            match_intents: vec![Intent::Compare],
            description: None,
        };
        // Appended after the built-in comparison template, so it never wins
        catalog.templates.insert("a-compare-alt", alt.clone());
        let decision = decide(&override_result(Intent::Compare), &catalog);
        assert_eq!(decision.template_id, "comparison-grid");

        // Listed first, it takes precedence
        let reordered: TemplateTable = std::iter::once(("z-compare-alt".to_string(), alt))
            .chain(catalog.templates.clone())
            .collect();
        catalog.templates = reordered;
        let decision = decide(&override_result(Intent::Compare), &catalog);
        assert_eq!(decision.template_id, "z-compare-alt");
    }

    #[test]
    fn test_missing_content_uses_default_entry() {
        let mut catalog = catalog();
        catalog.content.remove(&Intent::UseCase);
        let decision = decide(&override_result(Intent::UseCase), &catalog);
        assert_eq!(decision.content.headline, catalog.content[&Intent::Default].headline);
        assert!(decision.explanation.contains("using DEFAULT content"));
    }

    #[test]
    fn test_unknown_badge_and_image_keys_skipped() {
        let mut catalog = catalog();
        catalog.badges.clear();
        catalog.images.clear();
        let decision = decide(&override_result(Intent::BuyNow), &catalog);
        assert!(decision.badges.is_empty());
        assert!(decision.content.image.is_none());
    }

    #[test]
    fn test_decide_is_idempotent() {
        let catalog = catalog();
        let result = override_result(Intent::Compare);
        let first = decide(&result, &catalog).without_timestamp();
        let second = decide(&result, &catalog).without_timestamp();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
