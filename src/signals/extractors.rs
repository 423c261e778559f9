//! @acp:module "Signal Extractors"
//! @acp:summary "Pure functions turning visitor context into weighted intent signals"
//! @acp:domain personalization
//! @acp:layer logic
//!
//! Every extractor takes the context and the compiled tables and returns an
//! [`Extraction`]. None of them fail: a missing or malformed field yields an
//! empty extraction.

use serde::Serialize;
use url::Url;

use super::context::VisitorContext;
use super::tables::CompiledTables;
use super::types::{Intent, ScoreVector, Signal, SourceType};

/// Weight of explicit overrides (`intent=`, `persona=`, persona attribute)
pub const OVERRIDE_WEIGHT: f64 = 1.0;
pub const REFERRER_WEIGHT: f64 = 0.4;
pub const SEARCH_TERM_WEIGHT: f64 = 0.5;

/// UTM parameters and the weight of a keyword hit in each
pub const UTM_WEIGHTS: &[(&str, f64)] = &[
    ("utm_campaign", 0.6),
    ("utm_term", 0.5),
    ("utm_content", 0.4),
    ("utm_source", 0.2),
    ("utm_medium", 0.2),
];

pub const SEARCH_PARAMS: &[&str] = &["q", "query", "search", "s"];

/// Query keys that short-circuit extraction
pub const OVERRIDE_PARAMS: &[&str] = &["intent", "persona"];

/// Output of one extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub scores: ScoreVector,
    pub signals: Vec<Signal>,
    /// Set when an explicit override was found; later extractors are skipped
    #[serde(skip)]
    pub is_override: bool,
}

impl Extraction {
    fn push(&mut self, signal: Signal) {
        self.scores.add(signal.detected_intent, signal.weight);
        self.signals.push(signal);
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Run every extractor in a fixed order.
///
/// The query extractor runs first; if it reports an override the remaining
/// extractors are not consulted.
pub fn extract_all(context: &VisitorContext, tables: &CompiledTables) -> Vec<Extraction> {
    let query = extract_query(context, tables);
    if query.is_override {
        tracing::debug!("Query override present, skipping remaining extractors");
        return vec![query];
    }

    vec![
        query,
        extract_referrer(context, tables),
        extract_behavior(context, tables),
        extract_persona(context, tables),
        extract_device(context),
        extract_time(context),
        extract_resolution(context),
    ]
}

/// Lowercase and fold separators so `Spring_Sale`, `spring sale` and
/// `spring+sale` all read `spring-sale`
fn normalize_value(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '_' | '+' | ' ') { '-' } else { c })
        .collect()
}

/// UTM and search-term keyword matching, with `intent=`/`persona=` override
pub fn extract_query(context: &VisitorContext, tables: &CompiledTables) -> Extraction {
    let mut result = Extraction::default();

    for key in OVERRIDE_PARAMS {
        let Some(value) = context.param(key) else {
            continue;
        };
        let intent = value
            .parse::<Intent>()
            .ok()
            .or_else(|| tables.personas.get(&value.trim().to_lowercase()).copied());
        match intent {
            Some(intent) => {
                result.push(Signal::new(SourceType::Override, *key, value, intent, OVERRIDE_WEIGHT));
                result.is_override = true;
                return result;
            }
            None => tracing::debug!(key, value, "Ignoring unrecognized override value"),
        }
    }

    for (key, weight) in UTM_WEIGHTS {
        if let Some(value) = context.param(key) {
            keyword_signals(&mut result, SourceType::Utm, key, value, *weight, tables);
        }
    }

    for key in SEARCH_PARAMS {
        if let Some(value) = context.param(key) {
            keyword_signals(&mut result, SourceType::Query, key, value, SEARCH_TERM_WEIGHT, tables);
        }
    }

    result
}

/// At most one signal per intent for a given parameter
fn keyword_signals(
    result: &mut Extraction,
    source: SourceType,
    key: &str,
    value: &str,
    weight: f64,
    tables: &CompiledTables,
) {
    let normalized = normalize_value(value);
    for (intent, keywords) in &tables.query_keywords {
        if let Some(keyword) = keywords.iter().find(|k| normalized.contains(k.as_str())) {
            result.push(Signal::new(source, key, value, *intent, weight).with_pattern(keyword.as_str()));
        }
    }
}

/// Referrer host matching; only the first matching pattern counts
pub fn extract_referrer(context: &VisitorContext, tables: &CompiledTables) -> Extraction {
    let mut result = Extraction::default();
    let Some(referrer) = context.referrer.as_deref().filter(|r| !r.trim().is_empty()) else {
        return result;
    };

    let subject = Url::parse(referrer)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| referrer.trim().to_lowercase());

    if let Some((regex, intent)) = tables
        .referrer_patterns
        .iter()
        .find(|(regex, _)| regex.is_match(&subject))
    {
        result.push(
            Signal::new(SourceType::Referrer, "referrer", referrer, *intent, REFERRER_WEIGHT)
                .with_pattern(regex.as_str()),
        );
    }

    result
}

/// Behavior token lookup (`cart_abandon`, `viewed_pricing`, ...)
pub fn extract_behavior(context: &VisitorContext, tables: &CompiledTables) -> Extraction {
    let mut result = Extraction::default();
    let Some(token) = context.behavior.as_deref() else {
        return result;
    };

    let normalized = token.trim().to_lowercase().replace('-', "_");
    if let Some(rule) = tables.behavior_tokens.get(&normalized) {
        result.push(
            Signal::new(SourceType::Behavior, "behavior", token, rule.intent, rule.weight)
                .with_pattern(normalized),
        );
    }
    result
}

/// Persona attribute set by the host page; accepts intent names or persona labels
pub fn extract_persona(context: &VisitorContext, tables: &CompiledTables) -> Extraction {
    let mut result = Extraction::default();
    let Some(persona) = context.persona.as_deref().filter(|p| !p.trim().is_empty()) else {
        return result;
    };

    let intent = persona
        .parse::<Intent>()
        .ok()
        .or_else(|| tables.personas.get(&persona.trim().to_lowercase()).copied());

    if let Some(intent) = intent {
        result.push(Signal::new(SourceType::Persona, "persona", persona, intent, OVERRIDE_WEIGHT));
    }
    result
}

/// Coarse device class derived from touch support and screen width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }

    fn classify(touch: bool, width: u32) -> Self {
        match (touch, width) {
            (true, w) if w < 768 => DeviceClass::Mobile,
            (true, w) if w < 1024 => DeviceClass::Tablet,
            _ => DeviceClass::Desktop,
        }
    }

    fn evidence(&self) -> (Intent, f64) {
        match self {
            DeviceClass::Mobile => (Intent::BuyNow, 0.15),
            DeviceClass::Tablet => (Intent::UseCase, 0.1),
            DeviceClass::Desktop => (Intent::Compare, 0.1),
        }
    }
}

/// Device bucket heuristic; needs a screen width, touch defaults to false
pub fn extract_device(context: &VisitorContext) -> Extraction {
    let mut result = Extraction::default();
    let Some(width) = context.device.screen_width.filter(|w| *w > 0) else {
        return result;
    };
    let touch = context.device.touch.unwrap_or(false);
    let class = DeviceClass::classify(touch, width);
    let (intent, weight) = class.evidence();
    result.push(
        Signal::new(SourceType::Device, "device", format!("{}px touch={}", width, touch), intent, weight)
            .with_pattern(class.as_str()),
    );
    result
}

/// Local-hour bucket
pub fn extract_time(context: &VisitorContext) -> Extraction {
    let mut result = Extraction::default();
    let Some(hour) = context.local_hour.filter(|h| *h < 24) else {
        return result;
    };

    let (bucket, intent, weight) = match hour {
        0..=5 => ("night", Intent::Budget, 0.05),
        6..=11 => ("morning", Intent::UseCase, 0.05),
        12..=17 => ("afternoon", Intent::Compare, 0.05),
        _ => ("evening", Intent::BuyNow, 0.1),
    };
    result.push(
        Signal::new(SourceType::Time, "hour", hour.to_string(), intent, weight).with_pattern(bucket),
    );
    result
}

/// Effective resolution (CSS width x pixel ratio) bucket
pub fn extract_resolution(context: &VisitorContext) -> Extraction {
    let mut result = Extraction::default();
    let Some(width) = context.device.screen_width.filter(|w| *w > 0) else {
        return result;
    };
    let ratio = context
        .device
        .device_pixel_ratio
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0);
    let effective = (width as f64 * ratio).round() as u64;

    let bucket = match effective {
        e if e >= 2560 => Some(("high", Intent::Compare, 0.1)),
        e if e <= 1024 => Some(("low", Intent::BuyNow, 0.05)),
        _ => None,
    };
    if let Some((bucket, intent, weight)) = bucket {
        result.push(
            Signal::new(SourceType::Resolution, "effectiveWidth", effective.to_string(), intent, weight)
                .with_pattern(bucket),
        );
    }
    result
}

/// Classify an interaction target description (used by the context observer)
pub fn classify_target(text: &str, tables: &CompiledTables) -> Option<(Intent, String)> {
    tables
        .match_interaction(text)
        .map(|(intent, keyword)| (intent, keyword.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::context::DeviceInfo;

    fn tables() -> CompiledTables {
        CompiledTables::default()
    }

    #[test]
    fn test_empty_context_yields_nothing() {
        let ctx = VisitorContext::default();
        let t = tables();
        for extraction in extract_all(&ctx, &t) {
            assert!(extraction.is_empty());
            assert!(extraction.scores.is_zero());
        }
    }

    #[test]
    fn test_utm_campaign_keyword() {
        let ctx = VisitorContext::new().with_param("utm_campaign", "Spring_Comparison");
        let result = extract_query(&ctx, &tables());
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].detected_intent, Intent::Compare);
        assert_eq!(result.signals[0].weight, 0.6);
        assert_eq!(result.signals[0].matched_pattern.as_deref(), Some("compar"));
    }

    #[test]
    fn test_one_signal_per_intent_per_param() {
        let ctx = VisitorContext::new().with_param("utm_campaign", "buy-shop-order");
        let result = extract_query(&ctx, &tables());
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.scores.get(Intent::BuyNow), 0.6);
    }

    #[test]
    fn test_intent_override_short_circuits() {
        let ctx = VisitorContext::new()
            .with_param("intent", "budget")
            .with_param("utm_campaign", "compare")
            .with_referrer("https://www.google.com/")
            .with_behavior("cart_abandon");
        let all = extract_all(&ctx, &tables());
        assert_eq!(all.len(), 1);
        assert!(all[0].is_override);
        assert_eq!(all[0].signals[0].source_type, SourceType::Override);
        assert_eq!(all[0].scores.get(Intent::Budget), 1.0);
    }

    #[test]
    fn test_persona_param_override_uses_labels() {
        let ctx = VisitorContext::new().with_param("persona", "deal_hunter");
        let result = extract_query(&ctx, &tables());
        assert!(result.is_override);
        assert_eq!(result.signals[0].detected_intent, Intent::Budget);
    }

    #[test]
    fn test_unknown_override_value_falls_through() {
        let ctx = VisitorContext::new()
            .with_param("intent", "mystery")
            .with_param("utm_term", "cheap laptops");
        let result = extract_query(&ctx, &tables());
        assert!(!result.is_override);
        assert_eq!(result.signals[0].detected_intent, Intent::Budget);
    }

    #[test]
    fn test_referrer_first_match_only() {
        let ctx = VisitorContext::new().with_referrer("https://www.google.com/search?q=deals");
        let result = extract_referrer(&ctx, &tables());
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].detected_intent, Intent::Compare);
        assert_eq!(result.signals[0].weight, REFERRER_WEIGHT);
    }

    #[test]
    fn test_referrer_without_scheme() {
        let ctx = VisitorContext::new().with_referrer("slickdeals.net");
        let result = extract_referrer(&ctx, &tables());
        assert_eq!(result.signals[0].detected_intent, Intent::Budget);
    }

    #[test]
    fn test_unknown_referrer() {
        let ctx = VisitorContext::new().with_referrer("https://intranet.local/");
        assert!(extract_referrer(&ctx, &tables()).is_empty());
    }

    #[test]
    fn test_behavior_token() {
        let ctx = VisitorContext::new().with_behavior("Cart-Abandon");
        let result = extract_behavior(&ctx, &tables());
        assert_eq!(result.scores.get(Intent::BuyNow), 0.7);
    }

    #[test]
    fn test_persona_attribute() {
        let ctx = VisitorContext::new().with_persona("USE_CASE");
        let result = extract_persona(&ctx, &tables());
        assert_eq!(result.scores.get(Intent::UseCase), OVERRIDE_WEIGHT);
        assert!(!result.is_override);
    }

    #[test]
    fn test_device_buckets() {
        let mobile = VisitorContext::new().with_device(DeviceInfo {
            touch: Some(true),
            screen_width: Some(390),
            device_pixel_ratio: Some(3.0),
        });
        let result = extract_device(&mobile);
        assert_eq!(result.signals[0].matched_pattern.as_deref(), Some("mobile"));
        assert_eq!(result.scores.get(Intent::BuyNow), 0.15);

        let desktop = VisitorContext::new().with_device(DeviceInfo {
            touch: None,
            screen_width: Some(1440),
            device_pixel_ratio: None,
        });
        assert_eq!(extract_device(&desktop).scores.get(Intent::Compare), 0.1);
    }

    #[test]
    fn test_time_buckets() {
        let evening = VisitorContext::new().with_hour(21);
        assert_eq!(extract_time(&evening).scores.get(Intent::BuyNow), 0.1);
        let invalid = VisitorContext::new().with_hour(31);
        assert!(extract_time(&invalid).is_empty());
    }

    #[test]
    fn test_resolution_buckets() {
        let retina = VisitorContext::new().with_device(DeviceInfo {
            touch: Some(false),
            screen_width: Some(1440),
            device_pixel_ratio: Some(2.0),
        });
        assert_eq!(extract_resolution(&retina).scores.get(Intent::Compare), 0.1);

        let mid = VisitorContext::new().with_device(DeviceInfo {
            touch: Some(false),
            screen_width: Some(1440),
            device_pixel_ratio: Some(1.0),
        });
        assert!(extract_resolution(&mid).is_empty());
    }

    #[test]
    fn test_classify_target() {
        let t = tables();
        assert_eq!(classify_target("Compare models", &t).map(|(i, _)| i), Some(Intent::Compare));
        assert_eq!(classify_target("", &t), None);
    }
}
