#![forbid(unsafe_code)]
//! Hero personalization command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hero::commands::{
    execute_ab, execute_catalog, execute_decide, execute_init, execute_observe, AbSubcommand,
    CatalogOptions, DecideOptions, InitOptions, ObserveOptions,
};
use hero::config::DEFAULT_CONFIG_FILE;
use hero::{Config, Intent, RenderFormat, Variant};

#[derive(Parser)]
#[command(name = "hero")]
#[command(about = "Intent-driven hero personalization - explainable decisions from visit signals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .hero.config.json
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Template registry document
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Asset registry document
        #[arg(long)]
        assets: Option<PathBuf>,

        /// A/B state file
        #[arg(long)]
        ab_state: Option<PathBuf>,

        /// Disable A/B exploration
        #[arg(long)]
        no_ab: bool,
    },

    /// Personalize the hero for a described visit
    Decide {
        /// Landing page URL (its query string is read)
        #[arg(long)]
        url: Option<String>,

        /// Raw query string, e.g. "utm_campaign=comparison&q=specs"
        #[arg(short, long)]
        query: Option<String>,

        /// Referrer URL
        #[arg(short, long)]
        referrer: Option<String>,

        /// Persona attribute
        #[arg(long)]
        persona: Option<String>,

        /// Behavior token
        #[arg(long)]
        behavior: Option<String>,

        /// Touch device
        #[arg(long)]
        touch: Option<bool>,

        /// Screen width in CSS pixels
        #[arg(long)]
        width: Option<u32>,

        /// Device pixel ratio
        #[arg(long)]
        dpr: Option<f64>,

        /// Local hour (0-23), defaults to now
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,

        /// Force an intent (BUY_NOW, COMPARE, USE_CASE, BUDGET, DEFAULT)
        #[arg(short, long)]
        intent: Option<Intent>,

        /// Show explanation, signals and scores
        #[arg(short, long)]
        explain: bool,

        /// Output the decision as JSON
        #[arg(long)]
        json: bool,

        /// Render format: text, markdown, html
        #[arg(short, long, default_value = "text")]
        format: RenderFormat,
    },

    /// Replay interaction events through a context observer session
    Observe {
        /// JSON-lines event log
        #[arg(short, long)]
        events: PathBuf,

        /// Intent of the initial decision
        #[arg(short, long)]
        intent: Option<Intent>,

        /// Output the session summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and drive persisted A/B state
    Ab {
        #[command(subcommand)]
        cmd: AbCommands,
    },

    /// List templates and content of the effective catalog
    Catalog {
        /// Output the merged catalog as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AbCommands {
    /// Show counters, CTRs and winners
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record one impression
    Impression { intent: Intent, variant: Variant },
    /// Record one click
    Click { intent: Intent, variant: Variant },
    /// Clear persisted state
    Reset,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("HERO_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_or_warn(cli.config.exists().then_some(cli.config.as_path()));

    match cli.command {
        Commands::Init { force, templates, assets, ab_state, no_ab } => {
            let options = InitOptions {
                force,
                path: Some(cli.config.clone()),
                templates,
                assets,
                ab_state,
                no_ab,
            };
            execute_init(options)?;
        }

        Commands::Decide {
            url,
            query,
            referrer,
            persona,
            behavior,
            touch,
            width,
            dpr,
            hour,
            intent,
            explain,
            json,
            format,
        } => {
            let options = DecideOptions {
                url,
                query,
                referrer,
                persona,
                behavior,
                touch,
                width,
                dpr,
                hour,
                intent,
                explain,
                json,
                format,
            };
            execute_decide(options, &config)?;
        }

        Commands::Observe { events, intent, json } => {
            let options = ObserveOptions { events, intent, json };
            execute_observe(options, &config).await?;
        }

        Commands::Ab { cmd } => {
            let subcommand = match cmd {
                AbCommands::Status { json } => AbSubcommand::Status { json },
                AbCommands::Impression { intent, variant } => {
                    AbSubcommand::Impression { intent, variant }
                }
                AbCommands::Click { intent, variant } => AbSubcommand::Click { intent, variant },
                AbCommands::Reset => AbSubcommand::Reset,
            };
            execute_ab(subcommand, &config)?;
        }

        Commands::Catalog { json } => {
            execute_catalog(CatalogOptions { json }, &config)?;
        }
    }

    Ok(())
}
