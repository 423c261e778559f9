#![forbid(unsafe_code)]

//! @acp:module "Hero Library"
//! @acp:summary "Intent-driven hero personalization: signals, scoring, decisions, behavior, A/B"
//! @acp:domain personalization
//! @acp:layer api
//! @acp:stability beta
//!
//! # hero
//!
//! Personalizes a single page region by inferring why a visitor arrived and
//! picking the best-matching layout and copy from a fixed catalog.
//!
//! ## Features
//!
//! - **Signal extraction**: query/UTM keywords, referrer patterns, behavior
//!   tokens, persona, device, local hour and screen resolution
//! - **Intent scoring**: weighted aggregation with a fixed tie-break and
//!   concentration-based confidence
//! - **Explainable decisions**: deterministic template/content selection
//! - **Context observer**: re-personalization from live interaction events
//!   with settle delay, cooldown and decay
//! - **A/B exploration**: sticky per-intent variants and permanent winner lock
//!
//! ## Example
//!
//! ```rust,no_run
//! use hero::{Personalizer, VisitorContext};
//!
//! let mut personalizer = Personalizer::builtin();
//! let context = VisitorContext::from_url("https://shop.example/?utm_campaign=comparison")
//!     .with_referrer("https://www.google.com/search?q=x");
//!
//! let decision = personalizer.personalize(&context);
//! println!("{} -> {}", decision.intent, decision.template_id);
//! println!("{}", decision.explanation);
//! ```

pub mod ab;
pub mod analytics;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod decision;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod signals;

// Re-exports
pub use ab::{AbExplorer, AbState, FileStore, KeyValueStore, MemoryStore, Variant};
pub use analytics::{AnalyticsEvent, AnalyticsSink, MemorySink, TracingSink};
pub use catalog::{load_catalog, Catalog};
pub use config::Config;
pub use decision::{decide, ContentBundle, DecisionResult};
pub use error::{HeroError, Result};
pub use observer::{ContextObserver, InteractionEvent, ObserverConfig, ObserverSession, Trigger};
pub use pipeline::Personalizer;
pub use render::{render_or_fallback, HeroRenderer, RenderFormat, Renderer};
pub use scoring::{aggregate, score, IntentResult};
pub use signals::{
    extract_all, CompiledTables, DeviceInfo, Intent, ScoreVector, Signal, SignalTables,
    SourceType, VisitorContext,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
