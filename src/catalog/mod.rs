//! @acp:module "Catalog"
//! @acp:summary "Read-only registry of hero templates, copy, images and badges"
//! @acp:domain personalization
//! @acp:layer feature

pub mod loader;
pub mod types;

pub use loader::{load_builtin, load_catalog};
pub use types::*;
