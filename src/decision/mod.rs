//! @acp:module "Decision"
//! @acp:summary "Deterministic template/content selection with explanations"
//! @acp:domain personalization
//! @acp:layer feature

pub mod engine;
pub mod explain;
pub mod types;

pub use engine::{decide, is_fallback};
pub use types::{ContentBundle, DecisionResult};
