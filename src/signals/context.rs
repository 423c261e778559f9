//! @acp:module "Visitor Context"
//! @acp:summary "Read-only ambient facts the extractors inspect"
//! @acp:domain personalization
//! @acp:layer types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Device and viewport facts supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub touch: Option<bool>,
    #[serde(default)]
    pub screen_width: Option<u32>,
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,
}

/// Everything known about the visit at personalization time.
///
/// Every field is optional; extractors treat absence as "no evidence".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorContext {
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub device: DeviceInfo,
    #[serde(default)]
    pub local_hour: Option<u32>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub behavior: Option<String>,
}

impl VisitorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a landing-page URL, reading its query string.
    ///
    /// Unparseable URLs yield an empty query.
    pub fn from_url(url: &str) -> Self {
        let mut context = Self::default();
        match Url::parse(url) {
            Ok(parsed) => {
                for (key, value) in parsed.query_pairs() {
                    context.set_param(&key, &value);
                }
            }
            Err(e) => tracing::debug!(url, error = %e, "Ignoring unparseable landing URL"),
        }
        context
    }

    /// Add parameters from a raw query string (`a=1&b=2`, leading `?` allowed)
    pub fn with_query_string(mut self, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.set_param(&key, &value);
        }
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.set_param(key, value);
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_behavior(mut self, token: impl Into<String>) -> Self {
        self.behavior = Some(token.into());
        self
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    pub fn with_hour(mut self, hour: u32) -> Self {
        self.local_hour = Some(hour);
        self
    }

    /// Keys are lowercased; the first occurrence of a key wins
    fn set_param(&mut self, key: &str, value: &str) {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        self.query.entry(key).or_insert_with(|| value.to_string());
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}
