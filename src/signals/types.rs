//! @acp:module "Signal Types"
//! @acp:summary "Intent categories, weighted signals and per-intent score vectors"
//! @acp:domain personalization
//! @acp:layer types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HeroError;

/// Visitor-purpose categories the hero is personalized around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    BuyNow,
    Compare,
    UseCase,
    Budget,
    Default,
}

impl Intent {
    /// All categories, in tie-break order.
    pub fn all() -> &'static [Intent] {
        &[
            Intent::BuyNow,
            Intent::Compare,
            Intent::UseCase,
            Intent::Budget,
            Intent::Default,
        ]
    }

    /// Categories that can win a scoring round.
    ///
    /// The order is the tie-break rule: when two categories share the
    /// maximum score, the one listed first wins.
    pub fn scored() -> &'static [Intent] {
        &[
            Intent::BuyNow,
            Intent::Compare,
            Intent::UseCase,
            Intent::Budget,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::BuyNow => "BUY_NOW",
            Intent::Compare => "COMPARE",
            Intent::UseCase => "USE_CASE",
            Intent::Budget => "BUDGET",
            Intent::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = HeroError;

    /// Accepts `BUY_NOW`, `buy_now`, `buy-now` and `buynow` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "buynow" | "buy" => Ok(Intent::BuyNow),
            "compare" | "comparison" => Ok(Intent::Compare),
            "usecase" => Ok(Intent::UseCase),
            "budget" => Ok(Intent::Budget),
            "default" => Ok(Intent::Default),
            _ => Err(HeroError::UnknownIntent(s.to_string())),
        }
    }
}

/// Where a signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Override,
    Utm,
    Query,
    Referrer,
    Behavior,
    Persona,
    Device,
    Time,
    Resolution,
    Interaction,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Override => "override",
            SourceType::Utm => "utm",
            SourceType::Query => "query",
            SourceType::Referrer => "referrer",
            SourceType::Behavior => "behavior",
            SourceType::Persona => "persona",
            SourceType::Device => "device",
            SourceType::Time => "time",
            SourceType::Resolution => "resolution",
            SourceType::Interaction => "interaction",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of weighted evidence for an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub source_type: SourceType,
    pub key: String,
    pub raw_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    pub detected_intent: Intent,
    pub weight: f64,
}

impl Signal {
    pub fn new(
        source_type: SourceType,
        key: impl Into<String>,
        raw_value: impl Into<String>,
        detected_intent: Intent,
        weight: f64,
    ) -> Self {
        Self {
            source_type,
            key: key.into(),
            raw_value: raw_value.into(),
            matched_pattern: None,
            detected_intent,
            weight,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.matched_pattern = Some(pattern.into());
        self
    }
}

/// Accumulated score per intent; always carries all five categories
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    #[serde(rename = "BUY_NOW", default)]
    buy_now: f64,
    #[serde(rename = "COMPARE", default)]
    compare: f64,
    #[serde(rename = "USE_CASE", default)]
    use_case: f64,
    #[serde(rename = "BUDGET", default)]
    budget: f64,
    #[serde(rename = "DEFAULT", default)]
    default: f64,
}

impl ScoreVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, intent: Intent) -> f64 {
        match intent {
            Intent::BuyNow => self.buy_now,
            Intent::Compare => self.compare,
            Intent::UseCase => self.use_case,
            Intent::Budget => self.budget,
            Intent::Default => self.default,
        }
    }

    fn slot(&mut self, intent: Intent) -> &mut f64 {
        match intent {
            Intent::BuyNow => &mut self.buy_now,
            Intent::Compare => &mut self.compare,
            Intent::UseCase => &mut self.use_case,
            Intent::Budget => &mut self.budget,
            Intent::Default => &mut self.default,
        }
    }

    /// Add weight to an intent. Negative and non-finite weights are ignored
    /// so scores never drop below zero.
    pub fn add(&mut self, intent: Intent, weight: f64) {
        if weight.is_finite() && weight > 0.0 {
            *self.slot(intent) += weight;
        }
    }

    /// Component-wise sum
    pub fn merge(&mut self, other: &ScoreVector) {
        for intent in Intent::all() {
            self.add(*intent, other.get(*intent));
        }
    }

    /// Multiply every component by `factor` (clamped to `[0, 1]`)
    pub fn scale(&mut self, factor: f64) {
        let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
        for intent in Intent::all() {
            let slot = self.slot(*intent);
            *slot *= factor;
        }
    }

    pub fn total(&self) -> f64 {
        Intent::all().iter().map(|i| self.get(*i)).sum()
    }

    /// Highest-scoring non-DEFAULT intent, tie-broken by [`Intent::scored`] order
    pub fn max_scored(&self) -> (Intent, f64) {
        let mut best = (Intent::BuyNow, self.get(Intent::BuyNow));
        for intent in &Intent::scored()[1..] {
            let score = self.get(*intent);
            // Strict comparison keeps the earlier category on ties
            if score > best.1 {
                best = (*intent, score);
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intent, f64)> + '_ {
        Intent::all().iter().map(move |i| (*i, self.get(*i)))
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0.0
    }
}

impl From<&[Signal]> for ScoreVector {
    fn from(signals: &[Signal]) -> Self {
        let mut scores = ScoreVector::new();
        for signal in signals {
            scores.add(signal.detected_intent, signal.weight);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_from_str_spellings() {
        assert_eq!("BUY_NOW".parse::<Intent>().unwrap(), Intent::BuyNow);
        assert_eq!("buy-now".parse::<Intent>().unwrap(), Intent::BuyNow);
        assert_eq!("use_case".parse::<Intent>().unwrap(), Intent::UseCase);
        assert_eq!("Budget".parse::<Intent>().unwrap(), Intent::Budget);
        assert!("shopping".parse::<Intent>().is_err());
    }

    #[test]
    fn test_intent_serde_names() {
        let json = serde_json::to_string(&Intent::UseCase).unwrap();
        assert_eq!(json, "\"USE_CASE\"");
        let back: Intent = serde_json::from_str("\"BUY_NOW\"").unwrap();
        assert_eq!(back, Intent::BuyNow);
    }

    #[test]
    fn test_score_vector_has_all_keys() {
        let json = serde_json::to_value(ScoreVector::new()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert!(obj.contains_key("DEFAULT"));
    }

    #[test]
    fn test_add_ignores_negative_weight() {
        let mut scores = ScoreVector::new();
        scores.add(Intent::Budget, 0.3);
        scores.add(Intent::Budget, -1.0);
        scores.add(Intent::Budget, f64::NAN);
        assert_eq!(scores.get(Intent::Budget), 0.3);
    }

    #[test]
    fn test_max_scored_tie_break_prefers_enumeration_order() {
        let mut scores = ScoreVector::new();
        scores.add(Intent::Budget, 0.5);
        scores.add(Intent::Compare, 0.5);
        assert_eq!(scores.max_scored(), (Intent::Compare, 0.5));
    }

    #[test]
    fn test_max_scored_ignores_default() {
        let mut scores = ScoreVector::new();
        scores.add(Intent::Default, 5.0);
        scores.add(Intent::UseCase, 0.2);
        assert_eq!(scores.max_scored().0, Intent::UseCase);
    }

    #[test]
    fn test_scale_decays_every_component() {
        let mut scores = ScoreVector::new();
        scores.add(Intent::BuyNow, 1.0);
        scores.add(Intent::Compare, 0.5);
        scores.scale(0.4);
        assert!((scores.get(Intent::BuyNow) - 0.4).abs() < 1e-9);
        assert!((scores.get(Intent::Compare) - 0.2).abs() < 1e-9);
    }
}
