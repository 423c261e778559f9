//! @acp:module "Observer Configuration"
//! @acp:summary "Timing and threshold settings for behavioral re-personalization"
//! @acp:domain personalization
//! @acp:layer model

use serde::{Deserialize, Serialize};

/// @acp:summary "Context observer settings"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverConfig {
    /// Delay after session start before events are observed
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Minimum time between two re-personalizations
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Accumulated score an intent needs before it can take over
    #[serde(default = "default_min_confidence_shift")]
    pub min_confidence_shift: f64,
    /// Multiplier applied to every accumulated score after a re-personalization
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
    /// Pause between scroll samples that starts a new scroll sequence
    #[serde(default = "default_scroll_gap_ms")]
    pub scroll_gap_ms: u64,
    /// Hover duration that counts as interest
    #[serde(default = "default_hover_dwell_ms")]
    pub hover_dwell_ms: u64,
    /// Bounded event channel capacity of an observer session
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            cooldown_ms: default_cooldown_ms(),
            min_confidence_shift: default_min_confidence_shift(),
            decay_factor: default_decay_factor(),
            scroll_gap_ms: default_scroll_gap_ms(),
            hover_dwell_ms: default_hover_dwell_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_cooldown_ms() -> u64 {
    10_000
}

fn default_min_confidence_shift() -> f64 {
    0.6
}

fn default_decay_factor() -> f64 {
    0.4
}

fn default_scroll_gap_ms() -> u64 {
    500
}

fn default_hover_dwell_ms() -> u64 {
    800
}

fn default_channel_capacity() -> usize {
    64
}
