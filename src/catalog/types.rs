//! @acp:module "Catalog Types"
//! @acp:summary "Template and asset registry documents and the merged read-only catalog"
//! @acp:domain personalization
//! @acp:layer types

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::signals::Intent;

/// Template registry document (`templates.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRegistry {
    #[serde(default)]
    pub version: Option<String>,

    /// Document order is selection order
    pub templates: TemplateTable,

    pub default_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Display name
    pub name: String,

    #[serde(default)]
    pub match_intents: Vec<Intent>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Templates keyed by id, kept in the order they were listed.
///
/// Template selection takes the first entry whose `matchIntents` contains the
/// intent, so the registry author controls precedence by listing order.
/// Inserting an existing id replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateTable {
    entries: Vec<(String, Template)>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, t)| t)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns the replaced template when `id` was already present
    pub fn insert(&mut self, id: impl Into<String>, template: Template) -> Option<Template> {
        let id = id.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some((_, existing)) => Some(std::mem::replace(existing, template)),
            None => {
                self.entries.push((id, template));
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Template> {
        let pos = self.entries.iter().position(|(k, _)| k == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Template)> + '_ {
        self.entries.iter().map(|(k, t)| (k, t))
    }

    pub fn values(&self) -> impl Iterator<Item = &Template> + '_ {
        self.entries.iter().map(|(_, t)| t)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for TemplateTable {
    type Item = (String, Template);
    type IntoIter = std::vec::IntoIter<(String, Template)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Template)> for TemplateTable {
    fn from_iter<I: IntoIterator<Item = (String, Template)>>(iter: I) -> Self {
        let mut table = TemplateTable::new();
        for (id, template) in iter {
            table.insert(id, template);
        }
        table
    }
}

impl Serialize for TemplateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for TemplateTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = TemplateTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of template id to template")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TemplateTable, A::Error> {
                let mut table = TemplateTable::new();
                while let Some((id, template)) = map.next_entry::<String, Template>()? {
                    table.insert(id, template);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Asset registry document (`assets.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRegistry {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub images: BTreeMap<String, ImageAsset>,

    #[serde(default)]
    pub badges: BTreeMap<String, Badge>,

    #[serde(default)]
    pub content: BTreeMap<Intent, ContentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub label: String,
    #[serde(default)]
    pub tone: Option<String>,
}

/// Copy and asset keys for one intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub headline: String,
    #[serde(default)]
    pub subheadline: String,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default)]
    pub image_key: Option<String>,
    #[serde(default)]
    pub badge_keys: Vec<String>,
    /// Alternative copy served to variant B
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_b: Option<VariantCopy>,
}

/// Copy overrides for the B variant; unset fields keep the A copy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCopy {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subheadline: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
}

/// Where the effective catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogSource {
    /// Project registry documents
    Project,
    /// Registries embedded in the crate
    Builtin,
    /// Last-resort in-code catalog
    Minimal,
}

/// Merged, read-only catalog consulted by the decision engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Iterated in listing order during template selection
    pub templates: TemplateTable,
    pub default_template: String,
    pub content: BTreeMap<Intent, ContentEntry>,
    pub images: BTreeMap<String, ImageAsset>,
    pub badges: BTreeMap<String, Badge>,
    pub source: CatalogSource,
}

pub const MINIMAL_TEMPLATE_ID: &str = "default-hero";

impl Catalog {
    pub fn from_registries(
        templates: TemplateRegistry,
        assets: AssetRegistry,
        source: CatalogSource,
    ) -> Self {
        Self {
            templates: templates.templates,
            default_template: templates.default_template,
            content: assets.content,
            images: assets.images,
            badges: assets.badges,
            source,
        }
    }

    /// Smallest catalog that still renders a hero
    pub fn minimal() -> Self {
        let mut templates = TemplateTable::new();
        templates.insert(
            MINIMAL_TEMPLATE_ID,
            Template {
                name: "Default Hero".to_string(),
                match_intents: vec![Intent::Default],
                description: None,
            },
        );
        let mut content = BTreeMap::new();
        content.insert(Intent::Default, Self::minimal_content());

        Self {
            templates,
            default_template: MINIMAL_TEMPLATE_ID.to_string(),
            content,
            images: BTreeMap::new(),
            badges: BTreeMap::new(),
            source: CatalogSource::Minimal,
        }
    }

    pub(crate) fn minimal_content() -> ContentEntry {
        ContentEntry {
            headline: "Find what you need".to_string(),
            subheadline: "Explore our full range.".to_string(),
            cta_text: "Shop now".to_string(),
            cta_link: "/".to_string(),
            image_key: None,
            badge_keys: vec![],
            variant_b: None,
        }
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }
}
