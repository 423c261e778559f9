//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is in its own submodule with an options type and an
//! `execute_*` entry point.

pub mod ab;
pub mod catalog;
pub mod decide;
pub mod init;
pub mod observe;

pub use ab::{execute_ab, AbSubcommand};
pub use catalog::{execute_catalog, CatalogOptions};
pub use decide::{execute_decide, DecideOptions};
pub use init::{execute_init, InitOptions};
pub use observe::{execute_observe, ObserveOptions};
