//! @acp:module "Catalog Loader"
//! @acp:summary "Load template and asset registries with built-in fallback"
//! @acp:domain personalization
//! @acp:layer io

use anyhow::{Context, Result};
use std::path::Path;

use super::types::*;
use crate::signals::Intent;

/// Load the catalog with layered fallback:
/// 1. Built-in registries (embedded at compile time)
/// 2. Project registries merged over them, entry by entry, when readable
/// 3. The in-code minimal catalog if the built-ins cannot be parsed
///
/// Never fails; unreadable project documents are logged and skipped.
pub fn load_catalog(templates: Option<&Path>, assets: Option<&Path>) -> Catalog {
    let (mut template_registry, mut asset_registry) = match load_builtin() {
        Ok(builtin) => builtin,
        Err(e) => {
            tracing::warn!(error = %e, "Built-in registries unavailable, using minimal catalog");
            return Catalog::minimal();
        }
    };

    let mut source = CatalogSource::Builtin;

    if let Some(path) = templates {
        match load_document::<TemplateRegistry>(path) {
            Ok(project) => {
                template_registry = merge_templates(template_registry, project);
                source = CatalogSource::Project;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring project template registry"),
        }
    }

    if let Some(path) = assets {
        match load_document::<AssetRegistry>(path) {
            Ok(project) => {
                asset_registry = merge_assets(asset_registry, project);
                source = CatalogSource::Project;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring project asset registry"),
        }
    }

    let mut catalog = Catalog::from_registries(template_registry, asset_registry, source);
    ensure_defaults(&mut catalog);
    catalog
}

/// Embedded registries
pub fn load_builtin() -> Result<(TemplateRegistry, AssetRegistry)> {
    let templates = include_str!("../../registry/templates.json");
    let assets = include_str!("../../registry/assets.json");
    Ok((
        serde_json::from_str(templates).context("Failed to parse built-in templates.json")?,
        serde_json::from_str(assets).context("Failed to parse built-in assets.json")?,
    ))
}

fn load_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry from {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse registry from {:?}", path))
}

/// Project templates come first, in their listing order, so they take
/// precedence in selection; built-ins with other ids follow
fn merge_templates(base: TemplateRegistry, project: TemplateRegistry) -> TemplateRegistry {
    let mut templates = project.templates;
    for (id, template) in base.templates {
        if !templates.contains_key(&id) {
            templates.insert(id, template);
        }
    }
    let default_template = if project.default_template.is_empty() {
        base.default_template
    } else {
        project.default_template
    };
    TemplateRegistry {
        version: base.version,
        templates,
        default_template,
    }
}

/// Project images, badges and content replace built-ins with the same key
fn merge_assets(base: AssetRegistry, project: AssetRegistry) -> AssetRegistry {
    let mut result = base;
    result.images.extend(project.images);
    result.badges.extend(project.badges);
    result.content.extend(project.content);
    result
}

/// The default template and DEFAULT content must always resolve
fn ensure_defaults(catalog: &mut Catalog) {
    if !catalog.templates.contains_key(&catalog.default_template) {
        tracing::warn!(
            template = %catalog.default_template,
            "Default template missing from registry, restoring minimal default"
        );
        let minimal = Catalog::minimal();
        catalog.default_template = minimal.default_template.clone();
        for (id, template) in minimal.templates {
            catalog.templates.insert(id, template);
        }
    }
    catalog
        .content
        .entry(Intent::Default)
        .or_insert_with(Catalog::minimal_content);
}
