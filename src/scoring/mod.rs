//! @acp:module "Intent Scoring"
//! @acp:summary "Aggregate extractor score vectors into a winning intent and confidence"
//! @acp:domain personalization
//! @acp:layer logic

use serde::{Deserialize, Serialize};

use crate::signals::{Extraction, Intent, ScoreVector, Signal, SourceType};

/// Below this maximum score no category wins and DEFAULT is reported
pub const SCORE_FLOOR: f64 = 0.1;

/// Multiplier on the winner's share of total evidence
pub const CONFIDENCE_SCALE: f64 = 1.5;

/// Winning intent with its confidence and the totals it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub intent: Intent,
    pub confidence: f64,
    pub scores: ScoreVector,
}

/// Input of the decision engine: an aggregate plus the signals behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
    pub scores: ScoreVector,
    pub signals: Vec<Signal>,
}

/// Sum score vectors and pick the winner.
///
/// The maximum is taken over the four scored categories in
/// [`Intent::scored`] order, the first category reaching the maximum winning
/// ties. A maximum below [`SCORE_FLOOR`] yields DEFAULT with confidence 1.0:
/// no evidence is reported as a fully confident default. Otherwise the
/// confidence is `min(max / total * 1.5, 1.0)` rounded to two decimals, which
/// rewards one dominant category over raw magnitude.
pub fn aggregate(vectors: &[ScoreVector]) -> Aggregate {
    let mut totals = ScoreVector::new();
    for vector in vectors {
        totals.merge(vector);
    }

    let (winner, max) = totals.max_scored();
    if max < SCORE_FLOOR {
        return Aggregate {
            intent: Intent::Default,
            confidence: 1.0,
            scores: totals,
        };
    }

    let total = totals.total();
    let confidence = if total > 0.0 {
        round2((max / total * CONFIDENCE_SCALE).min(1.0))
    } else {
        0.0
    };

    Aggregate {
        intent: winner,
        confidence,
        scores: totals,
    }
}

/// Aggregate extractor outputs, keeping their signals for the explanation
pub fn score(extractions: Vec<Extraction>) -> IntentResult {
    let vectors: Vec<ScoreVector> = extractions.iter().map(|e| e.scores).collect();
    let aggregate = aggregate(&vectors);
    let signals = extractions.into_iter().flat_map(|e| e.signals).collect();

    tracing::debug!(
        intent = %aggregate.intent,
        confidence = aggregate.confidence,
        "Scored intent"
    );

    IntentResult {
        intent: aggregate.intent,
        confidence: aggregate.confidence,
        scores: aggregate.scores,
        signals,
    }
}

/// Result for a forced intent: one synthetic signal of weight 1.0, confidence 1.0
pub fn override_result(intent: Intent) -> IntentResult {
    let signal = Signal::new(SourceType::Override, "override", intent.as_str(), intent, 1.0);
    let mut scores = ScoreVector::new();
    scores.add(intent, 1.0);
    IntentResult {
        intent,
        confidence: 1.0,
        scores,
        signals: vec![signal],
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(Intent, f64)]) -> ScoreVector {
        let mut v = ScoreVector::new();
        for (intent, weight) in pairs {
            v.add(*intent, *weight);
        }
        v
    }

    #[test]
    fn test_no_vectors_is_confident_default() {
        let result = aggregate(&[]);
        assert_eq!(result.intent, Intent::Default);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_single_full_weight_signal() {
        let result = aggregate(&[vector(&[(Intent::UseCase, 1.0)])]);
        assert_eq!(result.intent, Intent::UseCase);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_below_floor_is_default() {
        let result = aggregate(&[vector(&[(Intent::Budget, 0.05), (Intent::BuyNow, 0.04)])]);
        assert_eq!(result.intent, Intent::Default);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.scores.get(Intent::Budget), 0.05);
    }

    #[test]
    fn test_floor_is_inclusive() {
        let result = aggregate(&[vector(&[(Intent::Budget, 0.1)])]);
        assert_eq!(result.intent, Intent::Budget);
    }

    #[test]
    fn test_confidence_rewards_concentration() {
        // 0.6 of 1.2 total -> 0.5 * 1.5 = 0.75
        let result = aggregate(&[
            vector(&[(Intent::Compare, 0.6)]),
            vector(&[(Intent::Budget, 0.4), (Intent::UseCase, 0.2)]),
        ]);
        assert_eq!(result.intent, Intent::Compare);
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_confidence_rounded_to_two_decimals() {
        // 0.5 / 1.3 * 1.5 = 0.5769...
        let result = aggregate(&[vector(&[
            (Intent::BuyNow, 0.5),
            (Intent::Compare, 0.4),
            (Intent::Budget, 0.4),
        ])]);
        assert_eq!(result.confidence, 0.58);
    }

    #[test]
    fn test_tie_goes_to_first_category() {
        let result = aggregate(&[vector(&[(Intent::Budget, 0.5), (Intent::BuyNow, 0.5)])]);
        assert_eq!(result.intent, Intent::BuyNow);
    }

    #[test]
    fn test_override_result() {
        let result = override_result(Intent::Compare);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].weight, 1.0);
        assert_eq!(result.scores.get(Intent::Compare), 1.0);
    }
}
