//! @acp:module "Decision Types"
//! @acp:summary "The resolved, explainable output of one personalization cycle"
//! @acp:domain personalization
//! @acp:layer types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ab::Variant;
use crate::catalog::{Badge, ImageAsset};
use crate::signals::{Intent, ScoreVector, Signal};

/// Copy and resolved image for the hero region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBundle {
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub intent: Intent,
    pub confidence: f64,
    pub template_id: String,
    pub content: ContentBundle,
    pub badges: Vec<Badge>,
    pub explanation: String,
    pub signals_used: Vec<Signal>,
    pub raw_scores: ScoreVector,
    /// True only when DEFAULT was reached with no signals at all
    pub fallback_used: bool,
    /// A/B variant served, set by the pipeline overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub timestamp: DateTime<Utc>,
}

impl DecisionResult {
    /// Copy of this decision with the timestamp zeroed, for comparing cycles
    pub fn without_timestamp(&self) -> Self {
        Self {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            ..self.clone()
        }
    }
}
