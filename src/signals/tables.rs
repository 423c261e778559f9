//! @acp:module "Signal Tables"
//! @acp:summary "Keyword, referrer-pattern, behavior-token and persona lookup tables"
//! @acp:domain personalization
//! @acp:layer data

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::types::Intent;

/// Serialized form of the lookup tables (`registry/signals.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalTables {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub query_keywords: BTreeMap<Intent, Vec<String>>,

    /// Ordered; the referrer extractor stops at the first match
    #[serde(default)]
    pub referrer_patterns: Vec<ReferrerPattern>,

    #[serde(default)]
    pub behavior_tokens: BTreeMap<String, BehaviorRule>,

    #[serde(default)]
    pub personas: BTreeMap<String, Intent>,

    #[serde(default)]
    pub interaction_keywords: BTreeMap<Intent, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferrerPattern {
    pub pattern: String,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub intent: Intent,
    pub weight: f64,
}

impl SignalTables {
    /// Tables shipped with the crate
    pub fn builtin() -> Self {
        let json = include_str!("../../registry/signals.json");
        match serde_json::from_str(json) {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(error = %e, "Built-in signal tables failed to parse, using empty tables");
                Self::default()
            }
        }
    }

    /// Load tables from a project document
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signal tables from {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse signal tables from {:?}", path))
    }

    /// Load from `path` if given and readable, otherwise the built-in tables
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load(p).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to built-in signal tables");
                Self::builtin()
            }),
            None => Self::builtin(),
        }
    }

    /// Compile patterns and normalize keywords for matching
    pub fn compile(&self) -> CompiledTables {
        let referrer_patterns = self
            .referrer_patterns
            .iter()
            .filter_map(|p| match Regex::new(&p.pattern) {
                Ok(regex) => Some((regex, p.intent)),
                Err(e) => {
                    tracing::warn!(pattern = %p.pattern, error = %e, "Skipping invalid referrer pattern");
                    None
                }
            })
            .collect();

        CompiledTables {
            query_keywords: keyword_table(&self.query_keywords),
            referrer_patterns,
            behavior_tokens: self
                .behavior_tokens
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
            personas: self
                .personas
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
            interaction_keywords: keyword_table(&self.interaction_keywords),
        }
    }
}

/// Keywords lowercased and listed in [`Intent::scored`] order
fn keyword_table(source: &BTreeMap<Intent, Vec<String>>) -> Vec<(Intent, Vec<String>)> {
    Intent::scored()
        .iter()
        .filter_map(|intent| {
            source.get(intent).map(|words| {
                let words = words
                    .iter()
                    .map(|w| w.to_lowercase())
                    .filter(|w| !w.trim().is_empty())
                    .collect();
                (*intent, words)
            })
        })
        .collect()
}

/// Lookup tables ready for matching
#[derive(Debug, Clone)]
pub struct CompiledTables {
    pub query_keywords: Vec<(Intent, Vec<String>)>,
    pub referrer_patterns: Vec<(Regex, Intent)>,
    pub behavior_tokens: BTreeMap<String, BehaviorRule>,
    pub personas: BTreeMap<String, Intent>,
    pub interaction_keywords: Vec<(Intent, Vec<String>)>,
}

impl Default for CompiledTables {
    fn default() -> Self {
        SignalTables::builtin().compile()
    }
}

impl CompiledTables {
    /// First intent whose keyword list has a substring hit in `text`
    pub fn match_interaction(&self, text: &str) -> Option<(Intent, &str)> {
        let text = format!(" {} ", text.to_lowercase());
        first_keyword_hit(&self.interaction_keywords, &text)
    }
}

pub(crate) fn first_keyword_hit<'a>(
    table: &'a [(Intent, Vec<String>)],
    text: &str,
) -> Option<(Intent, &'a str)> {
    table.iter().find_map(|(intent, words)| {
        words
            .iter()
            .find(|w| text.contains(w.as_str()))
            .map(|w| (*intent, w.as_str()))
    })
}
