//! Error types for host probing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing the host.
#[derive(Debug, Error)]
pub enum Error {
    /// A well-known system file is missing
    #[error("could not open {}, is this unix?", .0.display())]
    Missing(PathBuf),

    /// A system file exists but its contents could not be understood
    #[error("could not parse {what}: {message}")]
    Parse {
        /// What was being parsed (e.g. "/etc/lsb-release")
        what: String,
        /// What was wrong with it
        message: String,
    },

    /// A helper executable is not installed
    #[error("could not find {0}")]
    CommandNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }
}

/// Result type for host probing.
pub type Result<T> = std::result::Result<T, Error>;
