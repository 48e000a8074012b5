//! Errors raised while resolving shared configuration

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the folder and config file helpers
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unparsable config file
    #[error("Configuration error: {0}")]
    Config(String),
}
