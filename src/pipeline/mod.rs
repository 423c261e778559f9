//! @acp:module "Personalization Pipeline"
//! @acp:summary "One personalization cycle: extract, score, decide, A/B overlay, analytics"
//! @acp:domain personalization
//! @acp:layer service
//!
//! A [`Personalizer`] owns everything a cycle touches: the catalog, the
//! compiled signal tables, the A/B explorer and the analytics sink. Cycles
//! take `&mut self`, so one cannot start before the previous one returned its
//! decision. No cycle returns an error; every failure degrades to a default.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::ab::{AbExplorer, FileStore, KeyValueStore, MemoryStore, Variant};
use crate::analytics::{self, AnalyticsEvent, AnalyticsSink, TracingSink};
use crate::catalog::{load_catalog, Catalog, VariantCopy};
use crate::config::Config;
use crate::decision::{decide, DecisionResult};
use crate::observer::Trigger;
use crate::scoring::{override_result, score, IntentResult};
use crate::signals::{extract_all, CompiledTables, Intent, SignalTables, VisitorContext};

pub struct Personalizer {
    catalog: Catalog,
    tables: Arc<CompiledTables>,
    ab: Option<AbExplorer>,
    sink: Box<dyn AnalyticsSink>,
    session_id: Uuid,
    last_decision: Option<DecisionResult>,
}

impl Personalizer {
    /// Pipeline without A/B exploration, logging analytics through `tracing`
    pub fn new(catalog: Catalog, tables: CompiledTables) -> Self {
        Self {
            catalog,
            tables: Arc::new(tables),
            ab: None,
            sink: Box::new(TracingSink),
            session_id: Uuid::new_v4(),
            last_decision: None,
        }
    }

    /// Built-in catalog and signal tables
    pub fn builtin() -> Self {
        Self::new(load_catalog(None, None), CompiledTables::default())
    }

    /// Catalog, tables and A/B store as configured
    pub fn from_config(config: &Config) -> Self {
        let catalog = load_catalog(
            config.catalog.templates.as_deref(),
            config.catalog.assets.as_deref(),
        );
        let tables = SignalTables::load_or_builtin(config.signals.as_deref()).compile();
        let mut personalizer = Self::new(catalog, tables);

        if config.ab.enabled {
            let store: Box<dyn KeyValueStore> = match config.ab_state_path() {
                Some(path) => Box::new(FileStore::new(path)),
                None => {
                    tracing::warn!("No data directory for A/B state, using in-memory store");
                    Box::new(MemoryStore::new())
                }
            };
            personalizer.ab =
                Some(AbExplorer::new(store).with_min_sample_size(config.ab.min_sample_size));
        }
        personalizer
    }

    pub fn with_ab(mut self, ab: AbExplorer) -> Self {
        self.ab = Some(ab);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn AnalyticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tables(&self) -> Arc<CompiledTables> {
        Arc::clone(&self.tables)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn ab(&self) -> Option<&AbExplorer> {
        self.ab.as_ref()
    }

    pub fn ab_mut(&mut self) -> Option<&mut AbExplorer> {
        self.ab.as_mut()
    }

    pub fn last_decision(&self) -> Option<&DecisionResult> {
        self.last_decision.as_ref()
    }

    /// Score the intent from the visitor context
    pub fn score(&self, context: &VisitorContext) -> IntentResult {
        score(extract_all(context, &self.tables))
    }

    /// Full cycle from the visitor context
    pub fn personalize(&mut self, context: &VisitorContext) -> DecisionResult {
        let result = self.score(context);
        self.run_cycle(result)
    }

    /// Full cycle for a forced intent; extraction and scoring are skipped
    pub fn personalize_override(&mut self, intent: Intent) -> DecisionResult {
        self.run_cycle(override_result(intent))
    }

    /// Cycle for a behavioral shift reported by the context observer
    pub fn repersonalize(&mut self, trigger: &Trigger) -> DecisionResult {
        let decision = self.personalize_override(trigger.intent);
        self.emit(
            analytics::BEHAVIORAL_REPERSONALIZATION,
            json!({
                "from": trigger.from,
                "to": trigger.intent,
                "score": trigger.score,
                "atMs": trigger.at_ms,
                "templateId": decision.template_id,
            }),
        );
        decision
    }

    /// Count a CTA click against the decision currently shown
    pub fn record_cta_click(&mut self) -> Option<&DecisionResult> {
        let Some(decision) = self.last_decision.clone() else {
            tracing::debug!("CTA click without a decision, ignoring");
            return None;
        };

        if let (Some(ab), Some(variant)) = (self.ab.as_mut(), decision.variant) {
            ab.record_click(decision.intent, variant);
        }
        self.emit(
            analytics::CTA_CLICK,
            json!({
                "intent": decision.intent,
                "variant": decision.variant,
                "ctaLink": decision.content.cta_link,
            }),
        );
        self.last_decision.as_ref()
    }

    fn run_cycle(&mut self, result: IntentResult) -> DecisionResult {
        let mut decision = decide(&result, &self.catalog);
        self.apply_variant(&mut decision);

        self.emit(
            analytics::DECISION_MADE,
            json!({
                "intent": decision.intent,
                "confidence": decision.confidence,
                "templateId": decision.template_id,
                "fallbackUsed": decision.fallback_used,
                "signalCount": decision.signals_used.len(),
                "variant": decision.variant,
            }),
        );
        self.emit(
            analytics::IMPRESSION,
            json!({
                "intent": decision.intent,
                "templateId": decision.template_id,
                "variant": decision.variant,
            }),
        );

        tracing::info!(
            intent = %decision.intent,
            confidence = decision.confidence,
            template = %decision.template_id,
            "Personalized hero"
        );
        self.last_decision = Some(decision.clone());
        decision
    }

    /// Assign a variant, swap in variant B copy and count the impression
    fn apply_variant(&mut self, decision: &mut DecisionResult) {
        let Some(ab) = self.ab.as_mut() else {
            return;
        };

        let variant = ab.assign_variant(decision.intent);
        decision.variant = Some(variant);
        let winner = ab.record_impression(decision.intent, variant);

        if variant == Variant::B {
            let copy = self
                .catalog
                .content
                .get(&decision.intent)
                .and_then(|entry| entry.variant_b.clone());
            if let Some(copy) = copy {
                apply_copy(decision, &copy);
                self.emit(
                    analytics::VARIANT_SWAP,
                    json!({
                        "intent": decision.intent,
                        "variant": variant,
                        "headline": decision.content.headline,
                    }),
                );
            }
        }

        if let Some(winner) = winner {
            self.emit(
                analytics::AB_WINNER_DECLARED,
                json!({ "intent": decision.intent, "winner": winner }),
            );
        }
    }

    fn emit(&mut self, event_name: &str, mut data: serde_json::Value) {
        if let Some(map) = data.as_object_mut() {
            map.insert("sessionId".to_string(), json!(self.session_id));
        }
        self.sink.emit(AnalyticsEvent::new(event_name, data));
    }
}

fn apply_copy(decision: &mut DecisionResult, copy: &VariantCopy) {
    if let Some(headline) = &copy.headline {
        decision.content.headline = headline.clone();
    }
    if let Some(subheadline) = &copy.subheadline {
        decision.content.subheadline = subheadline.clone();
    }
    if let Some(cta_text) = &copy.cta_text {
        decision.content.cta_text = cta_text.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MemorySink;

    fn personalizer(sink: &MemorySink) -> Personalizer {
        Personalizer::builtin().with_sink(Box::new(sink.clone()))
    }

    #[test]
    fn test_cycle_emits_decision_and_impression() {
        let sink = MemorySink::new();
        let mut p = personalizer(&sink);
        let decision = p.personalize(&VisitorContext::new());

        assert_eq!(decision.intent, Intent::Default);
        assert_eq!(sink.names(), vec![analytics::DECISION_MADE, analytics::IMPRESSION]);
        let session = p.session_id().to_string();
        assert!(sink
            .events()
            .iter()
            .all(|e| e.data["sessionId"] == session.as_str()));
        assert_eq!(p.last_decision().map(|d| d.intent), Some(Intent::Default));
    }

    #[test]
    fn test_variant_b_swaps_copy() {
        let sink = MemorySink::new();
        let mut store = MemoryStore::new();
        let mut state = crate::ab::AbState::default();
        state.assignments.insert(Intent::Compare, Variant::B);
        store
            .set(crate::ab::AB_STORAGE_KEY, &serde_json::to_string(&state).unwrap())
            .unwrap();

        let mut p = personalizer(&sink).with_ab(AbExplorer::new(Box::new(store)));
        let decision = p.personalize_override(Intent::Compare);

        let expected = p.catalog().content[&Intent::Compare]
            .variant_b
            .as_ref()
            .and_then(|c| c.headline.clone())
            .unwrap();
        assert_eq!(decision.variant, Some(Variant::B));
        assert_eq!(decision.content.headline, expected);
        assert_eq!(sink.count(analytics::VARIANT_SWAP), 1);
    }

    #[test]
    fn test_cta_click_counts_variant() {
        let sink = MemorySink::new();
        let ab = AbExplorer::new(Box::new(MemoryStore::new())).with_seed(3);
        let mut p = personalizer(&sink).with_ab(ab);

        assert!(p.record_cta_click().is_none());
        let decision = p.personalize_override(Intent::Budget);
        p.record_cta_click();

        let stats = p.ab().unwrap().status().unwrap();
        let budget = stats.iter().find(|s| s.intent == Intent::Budget).unwrap();
        let variant = decision.variant.unwrap();
        assert_eq!(budget.clicks.get(variant), 1);
        assert_eq!(budget.impressions.get(variant), 1);
        assert_eq!(sink.count(analytics::CTA_CLICK), 1);
    }

    #[test]
    fn test_winner_event_emitted_once() {
        let sink = MemorySink::new();
        let ab = AbExplorer::new(Box::new(MemoryStore::new()))
            .with_seed(11)
            .with_min_sample_size(3);
        let mut p = personalizer(&sink).with_ab(ab);
        for _ in 0..6 {
            p.personalize_override(Intent::UseCase);
        }
        assert_eq!(sink.count(analytics::AB_WINNER_DECLARED), 1);
    }

    #[test]
    fn test_repersonalize_event() {
        let sink = MemorySink::new();
        let mut p = personalizer(&sink);
        let trigger = Trigger {
            from: Intent::Default,
            intent: Intent::BuyNow,
            score: 0.7,
            at_ms: 4_000,
        };
        let decision = p.repersonalize(&trigger);
        assert_eq!(decision.intent, Intent::BuyNow);
        let event = sink
            .events()
            .into_iter()
            .find(|e| e.event_name == analytics::BEHAVIORAL_REPERSONALIZATION)
            .unwrap();
        assert_eq!(event.data["from"], "DEFAULT");
        assert_eq!(event.data["to"], "BUY_NOW");
    }

    #[test]
    fn test_config_without_ab() {
        let mut config = Config::default();
        config.ab.enabled = false;
        let mut p = Personalizer::from_config(&config).with_sink(Box::new(MemorySink::new()));
        assert!(p.ab().is_none());
        assert_eq!(p.personalize_override(Intent::Compare).variant, None);
    }
}
