//! @acp:module "Catalog Command"
//! @acp:summary "List templates and content of the effective catalog"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;

use crate::catalog::{load_catalog, Catalog};
use crate::config::Config;

/// Options for the catalog command
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Print the merged catalog as JSON
    pub json: bool,
}

/// Execute the catalog command
pub fn execute_catalog(options: CatalogOptions, config: &Config) -> Result<()> {
    let catalog = load_catalog(
        config.catalog.templates.as_deref(),
        config.catalog.assets.as_deref(),
    );

    if options.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    println!("{} {:?}", style("Catalog source:").bold(), catalog.source);
    println!();

    println!("{}", style("Templates").bold().underlined());
    for (id, template) in catalog.templates.iter() {
        let intents: Vec<&str> = template.match_intents.iter().map(|i| i.as_str()).collect();
        let marker = if *id == catalog.default_template { " (default)" } else { "" };
        println!(
            "  {:<18} {}{} [{}]",
            style(id).cyan(),
            template.name,
            style(marker).dim(),
            intents.join(", ")
        );
    }
    if catalog.template(&catalog.default_template).is_none() {
        println!(
            "  {} default template '{}' is not defined",
            style("⚠").yellow(),
            catalog.default_template
        );
    }

    println!();
    println!("{}", style("Content").bold().underlined());
    for (intent, entry) in &catalog.content {
        let variant = if entry.variant_b.is_some() { " +B" } else { "" };
        println!(
            "  {:<9} {}{}",
            style(intent.as_str()).cyan(),
            entry.headline,
            style(variant).dim()
        );
        println!("            {} -> {}", entry.cta_text, entry.cta_link);
        if !entry.badge_keys.is_empty() {
            println!("            badges: {}", entry.badge_keys.join(", "));
        }
    }

    println!();
    println!(
        "{} images, {} badges",
        catalog.images.len(),
        catalog.badges.len()
    );
}
