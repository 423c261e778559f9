//! @acp:module "Observe Command"
//! @acp:summary "Replay an interaction event log through an observer session"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `hero observe --events <file.jsonl>`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::observer::{InteractionEvent, ObserverSession};
use crate::pipeline::Personalizer;
use crate::render::summary_line;
use crate::signals::{Intent, VisitorContext};

/// Options for the observe command
#[derive(Debug, Clone)]
pub struct ObserveOptions {
    /// JSON-lines event log
    pub events: PathBuf,
    /// Intent of the initial decision; scored from an empty context if unset
    pub intent: Option<Intent>,
    /// Print the session summary as JSON
    pub json: bool,
}

/// Execute the observe command
pub async fn execute_observe(options: ObserveOptions, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&options.events)
        .with_context(|| format!("Failed to read {}", options.events.display()))?;
    let events = InteractionEvent::parse_lines(&content)
        .with_context(|| format!("Failed to parse {}", options.events.display()))?;

    let mut personalizer = Personalizer::from_config(config);
    let initial = match options.intent {
        Some(intent) => personalizer.personalize_override(intent),
        None => personalizer.personalize(&VisitorContext::new()),
    };

    if !options.json {
        println!(
            "{} initial: {}",
            style("→").cyan(),
            summary_line(&initial)
        );
    }

    let handle = ObserverSession::spawn(personalizer, config.observer.clone());
    let total = events.len();
    for event in events {
        handle.send(event).await?;
    }
    let report = handle.finish().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
        return Ok(());
    }

    for (i, decision) in report.repersonalizations.iter().enumerate() {
        println!(
            "{} re-personalization {}: {}",
            style("✓").green(),
            i + 1,
            summary_line(decision)
        );
        println!("    {}", style(&decision.content.headline).dim());
    }
    if report.repersonalizations.is_empty() {
        println!("{} no behavioral shift detected", style("•").dim());
    }

    println!();
    println!("Events processed: {}/{}", report.events_processed, total);
    println!("Accumulated scores:");
    for (intent, value) in report.accumulator.scores.iter() {
        if intent != Intent::Default {
            println!("  {:<9} {:.2}", intent.as_str(), value);
        }
    }
    Ok(())
}
