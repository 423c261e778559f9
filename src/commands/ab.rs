//! @acp:module "A/B Command"
//! @acp:summary "Inspect and drive persisted A/B state"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `hero ab status|impression|click|reset`.

use anyhow::{anyhow, Result};
use console::style;

use crate::ab::{AbExplorer, FileStore, IntentStats, Variant};
use crate::config::Config;
use crate::signals::Intent;

/// A/B subcommands
#[derive(Debug, Clone)]
pub enum AbSubcommand {
    /// Show counters, CTRs and winners
    Status { json: bool },
    /// Count one impression
    Impression { intent: Intent, variant: Variant },
    /// Count one click
    Click { intent: Intent, variant: Variant },
    /// Delete all persisted state
    Reset,
}

/// Execute an A/B subcommand
pub fn execute_ab(cmd: AbSubcommand, config: &Config) -> Result<()> {
    let path = config
        .ab_state_path()
        .ok_or_else(|| anyhow!("No A/B state location; set ab.statePath in the config"))?;
    let mut ab = AbExplorer::new(Box::new(FileStore::new(&path)))
        .with_min_sample_size(config.ab.min_sample_size);

    match cmd {
        AbSubcommand::Status { json } => {
            let stats = ab.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_status(&stats, &path.display().to_string(), ab.min_sample_size());
            }
        }
        AbSubcommand::Impression { intent, variant } => match ab.record_impression(intent, variant) {
            Some(winner) => println!(
                "{} Impression recorded; winner locked for {}: {}",
                style("✓").green(),
                intent,
                style(winner).bold()
            ),
            None => println!("{} Impression recorded for {} {}", style("✓").green(), intent, variant),
        },
        AbSubcommand::Click { intent, variant } => {
            ab.record_click(intent, variant);
            println!("{} Click recorded for {} {}", style("✓").green(), intent, variant);
        }
        AbSubcommand::Reset => {
            ab.reset()?;
            println!("{} A/B state cleared", style("✓").green());
        }
    }
    Ok(())
}

fn print_status(stats: &[IntentStats], location: &str, min_sample_size: u64) {
    println!("{} {}", style("A/B state:").bold(), location);
    println!("Winner lock after {} impressions per intent", min_sample_size);
    println!();

    if stats.is_empty() {
        println!("  {}", style("no assignments yet").dim());
        return;
    }

    println!(
        "  {:<9} {:>8} {:>6} {:>9} {:>6} {:>7} {:>7}",
        "INTENT", "ASSIGNED", "WINNER", "IMPR A/B", "CLK", "CTR A", "CTR B"
    );
    for s in stats {
        let assigned = s.assigned.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        let winner = s.winner.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<9} {:>8} {:>6} {:>9} {:>6} {:>7.3} {:>7.3}",
            s.intent.as_str(),
            assigned,
            winner,
            format!("{}/{}", s.impressions.a, s.impressions.b),
            format!("{}/{}", s.clicks.a, s.clicks.b),
            s.ctr_a,
            s.ctr_b
        );
    }
}
