//! @acp:module "Context Observer"
//! @acp:summary "Session-scoped behavioral scoring with settle delay, cooldown and decay"
//! @acp:domain personalization
//! @acp:layer logic
//!
//! The observer starts `Idle` and moves to `Observing` once the settle delay
//! has passed; there is no terminal state. While observing, each classified
//! interaction adds a fixed weight for one intent. After every increment the
//! shift check runs: the top scored intent must reach `min_confidence_shift`,
//! differ from the active intent and the cooldown must have elapsed.
//!
//! A detected shift is returned as a [`Trigger`]. The caller runs the
//! re-personalization cycle and then calls [`ContextObserver::commit_trigger`],
//! which re-arms the cooldown and decays (not clears) the scores.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::ObserverConfig;
use super::events::InteractionEvent;
use super::scroll::ScrollTracker;
use crate::signals::extractors::classify_target;
use crate::signals::{CompiledTables, Intent, ScoreVector, Signal, SourceType};

pub const CLICK_WEIGHT: f64 = 0.35;
pub const HOVER_WEIGHT: f64 = 0.2;
pub const VISIBILITY_WEIGHT: f64 = 0.15;
pub const SCROLL_WEIGHT: f64 = 0.1;

/// Entries kept in the action log; oldest are dropped first
pub const ACTION_LOG_LIMIT: usize = 200;

/// A hover start with no matching end is forgotten after this long
pub const HOVER_EXPIRY_MS: u64 = 30_000;

/// Open hovers tracked at once; the oldest start is dropped first
pub const HOVER_TRACK_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObserverState {
    Idle,
    Observing,
}

/// One scored interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub at_ms: u64,
    pub signal: Signal,
}

/// Long-lived, decayable score vector for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAccumulator {
    pub scores: ScoreVector,
    pub last_trigger_ms: Option<u64>,
    pub action_log: VecDeque<ActionRecord>,
}

impl BehaviorAccumulator {
    pub fn record(&mut self, at_ms: u64, signal: Signal) {
        self.scores.add(signal.detected_intent, signal.weight);
        if self.action_log.len() == ACTION_LOG_LIMIT {
            self.action_log.pop_front();
        }
        self.action_log.push_back(ActionRecord { at_ms, signal });
    }

    fn cooldown_elapsed(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        match self.last_trigger_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
        }
    }
}

/// A detected intent shift awaiting its re-personalization cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub from: Intent,
    pub intent: Intent,
    pub score: f64,
    pub at_ms: u64,
}

pub struct ContextObserver {
    config: ObserverConfig,
    tables: Arc<CompiledTables>,
    state: ObserverState,
    active_intent: Intent,
    accumulator: BehaviorAccumulator,
    scroll: ScrollTracker,
    hovers: BTreeMap<String, u64>,
}

impl ContextObserver {
    pub fn new(config: ObserverConfig, tables: Arc<CompiledTables>) -> Self {
        let scroll = ScrollTracker::new(config.scroll_gap_ms);
        Self {
            config,
            tables,
            state: ObserverState::Idle,
            active_intent: Intent::Default,
            accumulator: BehaviorAccumulator::default(),
            scroll,
            hovers: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn accumulator(&self) -> &BehaviorAccumulator {
        &self.accumulator
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.accumulator.scores
    }

    /// Hover starts still waiting for their end
    pub fn open_hovers(&self) -> usize {
        self.hovers.len()
    }

    pub fn active_intent(&self) -> Intent {
        self.active_intent
    }

    /// Intent of the decision currently shown
    pub fn set_active_intent(&mut self, intent: Intent) {
        self.active_intent = intent;
    }

    /// Settle delay has passed
    pub fn begin_observing(&mut self) {
        if self.state == ObserverState::Idle {
            tracing::debug!("Context observer now observing");
            self.state = ObserverState::Observing;
        }
    }

    /// Score one event and run the shift check.
    ///
    /// Events that arrive while idle, before the settle delay, are dropped.
    /// A returned trigger must be committed before the next event is handled.
    pub fn handle(&mut self, event: &InteractionEvent) -> Option<Trigger> {
        let at_ms = event.at_ms();
        if self.state == ObserverState::Idle {
            if at_ms < self.config.settle_delay_ms {
                tracing::trace!(kind = event.kind(), at_ms, "Dropping event before settle delay");
                return None;
            }
            self.begin_observing();
        }

        let signal = self.classify(event, at_ms)?;
        tracing::trace!(
            kind = event.kind(),
            intent = %signal.detected_intent,
            weight = signal.weight,
            "Behavioral signal"
        );
        self.accumulator.record(at_ms, signal);
        self.check_shift(at_ms)
    }

    /// Re-arm the cooldown and decay the scores after a completed cycle
    pub fn commit_trigger(&mut self, trigger: &Trigger) {
        self.accumulator.last_trigger_ms = Some(trigger.at_ms);
        self.accumulator.scores.scale(self.config.decay_factor);
        self.active_intent = trigger.intent;
        tracing::debug!(
            intent = %trigger.intent,
            decay = self.config.decay_factor,
            "Behavioral trigger committed"
        );
    }

    fn classify(&mut self, event: &InteractionEvent, at_ms: u64) -> Option<Signal> {
        match event {
            InteractionEvent::Scroll { position, .. } => {
                let pattern = self.scroll.push(*position, at_ms)?;
                Some(
                    Signal::new(
                        SourceType::Interaction,
                        "scroll",
                        pattern.as_str(),
                        pattern.intent(),
                        SCROLL_WEIGHT,
                    )
                    .with_pattern(pattern.as_str()),
                )
            }
            InteractionEvent::Click { target, .. } => self.target_signal("click", target, CLICK_WEIGHT),
            InteractionEvent::HoverStart { target, .. } => {
                self.expire_hovers(at_ms);
                if self.hovers.len() >= HOVER_TRACK_LIMIT && !self.hovers.contains_key(target) {
                    let oldest = self
                        .hovers
                        .iter()
                        .min_by_key(|(_, started)| **started)
                        .map(|(t, _)| t.clone());
                    if let Some(oldest) = oldest {
                        self.hovers.remove(&oldest);
                    }
                }
                self.hovers.insert(target.clone(), at_ms);
                None
            }
            InteractionEvent::HoverEnd { target, .. } => {
                self.expire_hovers(at_ms);
                let started = self.hovers.remove(target)?;
                if at_ms.saturating_sub(started) < self.config.hover_dwell_ms {
                    return None;
                }
                self.target_signal("hover", target, HOVER_WEIGHT)
            }
            InteractionEvent::Visible { target, .. } => {
                self.target_signal("visible", target, VISIBILITY_WEIGHT)
            }
        }
    }

    fn expire_hovers(&mut self, now_ms: u64) {
        self.hovers
            .retain(|_, started| now_ms.saturating_sub(*started) <= HOVER_EXPIRY_MS);
    }

    fn target_signal(&self, key: &str, target: &str, weight: f64) -> Option<Signal> {
        let (intent, keyword) = classify_target(target, &self.tables)?;
        Some(Signal::new(SourceType::Interaction, key, target, intent, weight).with_pattern(keyword))
    }

    fn check_shift(&self, at_ms: u64) -> Option<Trigger> {
        let (intent, score) = self.accumulator.scores.max_scored();
        if score < self.config.min_confidence_shift || intent == self.active_intent {
            return None;
        }
        if !self
            .accumulator
            .cooldown_elapsed(at_ms, self.config.cooldown_ms)
        {
            tracing::debug!(intent = %intent, score, "Behavioral shift suppressed by cooldown");
            return None;
        }
        Some(Trigger {
            from: self.active_intent,
            intent,
            score,
            at_ms,
        })
    }
}
