//! @acp:module "Errors"
//! @acp:summary "Crate error type and result alias"
//! @acp:domain personalization
//! @acp:layer types

use thiserror::Error;

/// Errors surfaced by the hero library.
///
/// The personalization cycle itself never returns these; they come from
/// loading documents, persisting A/B state and rendering.
#[derive(Error, Debug)]
pub enum HeroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HeroError>;
