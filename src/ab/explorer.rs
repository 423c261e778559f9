//! @acp:module "A/B Explorer"
//! @acp:summary "Sticky per-intent variant assignment with impression/click counters and winner lock"
//! @acp:domain personalization
//! @acp:layer logic
//!
//! State lives in one JSON document in a [`KeyValueStore`] and is
//! read-modify-written on every call. Two processes sharing the store can
//! race and lose increments; this is not guarded against.
//!
//! Winner selection is a raw-count heuristic: once an intent has
//! `min_sample_size` impressions, the variant with the higher click-through
//! rate is locked (ties go to A). There is no significance test and a lock is
//! never reopened.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::store::KeyValueStore;
use super::{AbState, Variant, VariantCounts};
use crate::error::Result;
use crate::signals::Intent;

pub const AB_STORAGE_KEY: &str = "hero.ab.state";
pub const MIN_SAMPLE_SIZE: u64 = 100;

/// Per-intent snapshot for inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentStats {
    pub intent: Intent,
    pub assigned: Option<Variant>,
    pub winner: Option<Variant>,
    pub impressions: VariantCounts,
    pub clicks: VariantCounts,
    pub ctr_a: f64,
    pub ctr_b: f64,
}

pub struct AbExplorer {
    store: Box<dyn KeyValueStore>,
    rng: StdRng,
    min_sample_size: u64,
}

impl AbExplorer {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            rng: StdRng::from_os_rng(),
            min_sample_size: MIN_SAMPLE_SIZE,
        }
    }

    /// Deterministic assignment order, for tests and replays
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_min_sample_size(mut self, min_sample_size: u64) -> Self {
        self.min_sample_size = min_sample_size.max(1);
        self
    }

    pub fn min_sample_size(&self) -> u64 {
        self.min_sample_size
    }

    fn random_variant(&mut self) -> Variant {
        if self.rng.random_bool(0.5) {
            Variant::A
        } else {
            Variant::B
        }
    }

    pub fn load(&self) -> Result<AbState> {
        match self.store.get(AB_STORAGE_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(AbState::default()),
        }
    }

    fn save(&mut self, state: &AbState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.store.set(AB_STORAGE_KEY, &json)
    }

    /// Variant to serve for `intent`.
    ///
    /// A locked winner always wins. Otherwise the stored assignment is
    /// returned; assignments are sticky per intent for the whole storage
    /// scope, not per visitor session. New assignments are uniform random and
    /// persisted. With storage unavailable every call draws a fresh variant.
    pub fn assign_variant(&mut self, intent: Intent) -> Variant {
        let mut state = match self.load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "A/B storage unavailable, assigning without memory");
                return self.random_variant();
            }
        };

        if let Some(winner) = state.winners.get(&intent) {
            return *winner;
        }
        if let Some(assigned) = state.assignments.get(&intent) {
            return *assigned;
        }

        let variant = self.random_variant();
        state.assignments.insert(intent, variant);
        if let Err(e) = self.save(&state) {
            tracing::warn!(error = %e, "Failed to persist A/B assignment");
        }
        tracing::debug!(intent = %intent, variant = %variant, "Assigned A/B variant");
        variant
    }

    /// Count an impression and run the winner check.
    ///
    /// Returns the variant if this impression locked a winner.
    pub fn record_impression(&mut self, intent: Intent, variant: Variant) -> Option<Variant> {
        let mut state = match self.load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "A/B storage unavailable, impression dropped");
                return None;
            }
        };

        state.impressions.entry(intent).or_default().increment(variant);
        let winner = check_for_winner(&mut state, intent, self.min_sample_size);

        if let Err(e) = self.save(&state) {
            tracing::warn!(error = %e, "Failed to persist A/B impression");
            return None;
        }
        if let Some(w) = winner {
            tracing::info!(intent = %intent, winner = %w, "A/B winner locked");
        }
        winner
    }

    pub fn record_click(&mut self, intent: Intent, variant: Variant) {
        let mut state = match self.load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "A/B storage unavailable, click dropped");
                return;
            }
        };

        state.clicks.entry(intent).or_default().increment(variant);
        if let Err(e) = self.save(&state) {
            tracing::warn!(error = %e, "Failed to persist A/B click");
        }
    }

    pub fn winner(&self, intent: Intent) -> Option<Variant> {
        self.load().ok().and_then(|s| s.winners.get(&intent).copied())
    }

    /// Counters, CTRs and winners for every intent that has any state
    pub fn status(&self) -> Result<Vec<IntentStats>> {
        let state = self.load()?;
        let stats = Intent::all()
            .iter()
            .filter(|i| state.touches(**i))
            .map(|intent| {
                let impressions = state.impressions.get(intent).copied().unwrap_or_default();
                let clicks = state.clicks.get(intent).copied().unwrap_or_default();
                IntentStats {
                    intent: *intent,
                    assigned: state.assignments.get(intent).copied(),
                    winner: state.winners.get(intent).copied(),
                    impressions,
                    clicks,
                    ctr_a: ctr(clicks.a, impressions.a),
                    ctr_b: ctr(clicks.b, impressions.b),
                }
            })
            .collect();
        Ok(stats)
    }

    /// Drop all persisted A/B state
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(AB_STORAGE_KEY)
    }
}

/// Click-through rate, 0 with no impressions
pub fn ctr(clicks: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        clicks as f64 / impressions as f64
    }
}

/// Lock a winner for `intent` once total impressions reach `min_sample_size`
pub fn check_for_winner(state: &mut AbState, intent: Intent, min_sample_size: u64) -> Option<Variant> {
    if state.winners.contains_key(&intent) {
        return None;
    }

    let impressions = state.impressions.get(&intent).copied().unwrap_or_default();
    if impressions.total() < min_sample_size {
        return None;
    }

    let clicks = state.clicks.get(&intent).copied().unwrap_or_default();
    let ctr_a = ctr(clicks.a, impressions.a);
    let ctr_b = ctr(clicks.b, impressions.b);
    let winner = if ctr_b > ctr_a { Variant::B } else { Variant::A };

    state.winners.insert(intent, winner);
    Some(winner)
}

impl AbState {
    fn touches(&self, intent: Intent) -> bool {
        self.assignments.contains_key(&intent)
            || self.impressions.contains_key(&intent)
            || self.clicks.contains_key(&intent)
            || self.winners.contains_key(&intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ab::store::MemoryStore;
    use crate::error::HeroError;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(HeroError::StorageUnavailable("denied".to_string()))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(HeroError::StorageUnavailable("denied".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(HeroError::StorageUnavailable("denied".to_string()))
        }
    }

    fn explorer() -> AbExplorer {
        AbExplorer::new(Box::new(MemoryStore::new()))
            .with_seed(7)
            .with_min_sample_size(10)
    }

    #[test]
    fn test_assignment_is_sticky() {
        let mut ab = explorer();
        let first = ab.assign_variant(Intent::Compare);
        for _ in 0..20 {
            assert_eq!(ab.assign_variant(Intent::Compare), first);
        }
    }

    #[test]
    fn test_winner_locked_at_sample_size() {
        let mut ab = explorer();
        for i in 0..9 {
            let variant = if i % 2 == 0 { Variant::A } else { Variant::B };
            assert_eq!(ab.record_impression(Intent::Budget, variant), None);
        }
        ab.record_click(Intent::Budget, Variant::B);
        assert_eq!(ab.record_impression(Intent::Budget, Variant::A), Some(Variant::B));
        assert_eq!(ab.winner(Intent::Budget), Some(Variant::B));
        assert_eq!(ab.assign_variant(Intent::Budget), Variant::B);
    }

    #[test]
    fn test_winner_never_changes() {
        let mut ab = explorer();
        for _ in 0..10 {
            ab.record_impression(Intent::BuyNow, Variant::A);
        }
        assert_eq!(ab.winner(Intent::BuyNow), Some(Variant::A));

        for _ in 0..50 {
            ab.record_impression(Intent::BuyNow, Variant::B);
            ab.record_click(Intent::BuyNow, Variant::B);
        }
        assert_eq!(ab.winner(Intent::BuyNow), Some(Variant::A));
    }

    #[test]
    fn test_ctr_tie_goes_to_a() {
        let mut state = AbState::default();
        state.impressions.insert(Intent::UseCase, VariantCounts { a: 5, b: 5 });
        state.clicks.insert(Intent::UseCase, VariantCounts { a: 1, b: 1 });
        assert_eq!(check_for_winner(&mut state, Intent::UseCase, 10), Some(Variant::A));
    }

    #[test]
    fn test_ctr_without_impressions_is_zero() {
        assert_eq!(ctr(3, 0), 0.0);
        assert_eq!(ctr(1, 4), 0.25);
    }

    #[test]
    fn test_storage_unavailable_degrades() {
        let mut ab = AbExplorer::new(Box::new(BrokenStore)).with_seed(1);
        let _ = ab.assign_variant(Intent::Compare);
        assert_eq!(ab.record_impression(Intent::Compare, Variant::A), None);
        ab.record_click(Intent::Compare, Variant::A);
        assert!(ab.status().is_err());
    }

    #[test]
    fn test_status_and_reset() {
        let mut ab = explorer();
        ab.assign_variant(Intent::Compare);
        ab.record_impression(Intent::Compare, Variant::A);
        let status = ab.status().unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].impressions.a, 1);

        ab.reset().unwrap();
        assert!(ab.status().unwrap().is_empty());
    }
}
