//! Conversation input: CSV loading and customer-only excerpt formatting.

pub mod formatter;
pub mod loader;

pub use formatter::*;
pub use loader::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot open conversation file {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Conversation file is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
