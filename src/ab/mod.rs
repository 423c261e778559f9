//! @acp:module "A/B"
//! @acp:summary "Persisted variant assignment, counters and winner selection per intent"
//! @acp:domain personalization
//! @acp:layer feature

pub mod explorer;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::HeroError;
use crate::signals::Intent;

pub use explorer::{check_for_winner, ctr, AbExplorer, IntentStats, AB_STORAGE_KEY, MIN_SAMPLE_SIZE};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// One of the two content alternatives served for an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::A => "A",
            Variant::B => "B",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = HeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Variant::A),
            "B" => Ok(Variant::B),
            other => Err(HeroError::Other(format!("Unknown variant: {}", other))),
        }
    }
}

/// Impression or click tally per variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCounts {
    #[serde(rename = "A", default)]
    pub a: u64,
    #[serde(rename = "B", default)]
    pub b: u64,
}

impl VariantCounts {
    pub fn get(&self, variant: Variant) -> u64 {
        match variant {
            Variant::A => self.a,
            Variant::B => self.b,
        }
    }

    pub fn increment(&mut self, variant: Variant) {
        match variant {
            Variant::A => self.a += 1,
            Variant::B => self.b += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.a + self.b
    }
}

/// Persisted A/B document; a winner entry is permanent for the storage scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbState {
    #[serde(default)]
    pub assignments: BTreeMap<Intent, Variant>,
    #[serde(default)]
    pub impressions: BTreeMap<Intent, VariantCounts>,
    #[serde(default)]
    pub clicks: BTreeMap<Intent, VariantCounts>,
    #[serde(default)]
    pub winners: BTreeMap<Intent, Variant>,
}
