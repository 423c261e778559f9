//! @acp:module "Signals"
//! @acp:summary "Intent evidence: visitor context, lookup tables and extractors"
//! @acp:domain personalization
//! @acp:layer feature

pub mod context;
pub mod extractors;
pub mod tables;
pub mod types;

pub use context::{DeviceInfo, VisitorContext};
pub use extractors::{extract_all, DeviceClass, Extraction};
pub use tables::{BehaviorRule, CompiledTables, ReferrerPattern, SignalTables};
pub use types::*;
