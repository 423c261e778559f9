//! @acp:module "Decide Command"
//! @acp:summary "Run one personalization cycle for a described visit"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `hero decide`.

use anyhow::{Context, Result};
use chrono::Timelike;
use console::style;

use crate::config::Config;
use crate::decision::DecisionResult;
use crate::pipeline::Personalizer;
use crate::render::{render_or_fallback, summary_line, HeroRenderer, RenderFormat};
use crate::signals::{DeviceInfo, Intent, VisitorContext};

/// Options for the decide command
#[derive(Debug, Clone, Default)]
pub struct DecideOptions {
    /// Landing page URL whose query string is read
    pub url: Option<String>,
    /// Extra raw query string (`utm_campaign=x&q=y`)
    pub query: Option<String>,
    pub referrer: Option<String>,
    pub persona: Option<String>,
    /// Behavior token (e.g. `cart_abandoner`)
    pub behavior: Option<String>,
    pub touch: Option<bool>,
    pub width: Option<u32>,
    pub dpr: Option<f64>,
    /// Local hour 0-23; defaults to the current local hour
    pub hour: Option<u32>,
    /// Force an intent, skipping extraction and scoring
    pub intent: Option<Intent>,
    /// Print explanation and signals
    pub explain: bool,
    /// Print the decision as JSON
    pub json: bool,
    pub format: RenderFormat,
}

impl DecideOptions {
    /// Visitor context described by these options
    pub fn context(&self) -> VisitorContext {
        let mut context = match &self.url {
            Some(url) => VisitorContext::from_url(url),
            None => VisitorContext::new(),
        };
        if let Some(query) = &self.query {
            context = context.with_query_string(query);
        }
        if let Some(referrer) = &self.referrer {
            context = context.with_referrer(referrer.as_str());
        }
        if let Some(persona) = &self.persona {
            context = context.with_persona(persona.as_str());
        }
        if let Some(behavior) = &self.behavior {
            context = context.with_behavior(behavior.as_str());
        }
        if self.touch.is_some() || self.width.is_some() || self.dpr.is_some() {
            context = context.with_device(DeviceInfo {
                touch: self.touch,
                screen_width: self.width,
                device_pixel_ratio: self.dpr,
            });
        }
        let hour = self.hour.unwrap_or_else(|| chrono::Local::now().hour());
        context.with_hour(hour)
    }
}

/// Execute the decide command
pub fn execute_decide(options: DecideOptions, config: &Config) -> Result<()> {
    let mut personalizer = Personalizer::from_config(config);

    let decision = match options.intent {
        Some(intent) => personalizer.personalize_override(intent),
        None => personalizer.personalize(&options.context()),
    };

    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&decision).context("Failed to serialize decision")?
        );
        return Ok(());
    }

    print_decision(&decision, options.format)?;
    if options.explain {
        print_explanation(&decision);
    }
    Ok(())
}

fn print_decision(decision: &DecisionResult, format: RenderFormat) -> Result<()> {
    let renderer = HeroRenderer::new(format).context("Failed to build hero renderer")?;
    let original = format!("{}\n{}", decision.content.headline, decision.content.subheadline);

    println!("{} {}", style("✓").green(), style(summary_line(decision)).bold());
    if decision.fallback_used {
        println!("  {}", style("no personalization signals, showing default").dim());
    }
    println!();
    println!("{}", render_or_fallback(&renderer, decision, &original));
    Ok(())
}

fn print_explanation(decision: &DecisionResult) {
    println!();
    println!("{}", style("Explanation").bold().underlined());
    println!("  {}", decision.explanation);

    if decision.signals_used.is_empty() {
        return;
    }
    println!();
    println!("{}", style("Signals").bold().underlined());
    for signal in &decision.signals_used {
        let pattern = signal
            .matched_pattern
            .as_deref()
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();
        println!(
            "  {:<11} {}={}{} -> {} ({:.2})",
            signal.source_type.as_str(),
            signal.key,
            signal.raw_value,
            style(pattern).dim(),
            style(signal.detected_intent).cyan(),
            signal.weight
        );
    }

    println!();
    println!("{}", style("Scores").bold().underlined());
    for (intent, value) in decision.raw_scores.iter() {
        println!("  {:<9} {:.2}", intent.as_str(), value);
    }
}
