//! User-facing error type for every tuffix command.
//!
//! Each variant belongs to one [`ErrorKind`]; `main` prints every error with
//! an `[ERROR]:` prefix and additionally shows usage text for usage errors.

use crate::registry::{SetupError, UnknownKeyword};
use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a failure, deciding how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or invalid invocation, fixable by the user
    Usage,
    /// The host does not meet a precondition
    Environment,
    /// State file missing or corrupt
    State,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Environment(String),

    #[error("you do not have root access; run this command like $ sudo tuffix ...")]
    Permission,

    #[error("another tuffix process is running{}; lock file {}", holder_suffix(.holder), .path.display())]
    Busy {
        path: PathBuf,
        holder: Option<String>,
    },

    #[error("could not {verb} {keyword}: {source}")]
    Setup {
        keyword: String,
        verb: &'static str,
        #[source]
        source: SetupError,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file not found, you must run $ tuffix init")]
    StateUnavailable { path: PathBuf },

    #[error("state file {} is corrupt: {reason}", .path.display())]
    StateCorrupt { path: PathBuf, reason: String },
}

fn holder_suffix(holder: &Option<String>) -> String {
    holder
        .as_ref()
        .map(|h| format!(" ({h})"))
        .unwrap_or_default()
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a helper failure (subprocess, prompt) as an environment error.
    pub fn from_helper(err: &anyhow::Error) -> Self {
        Self::Environment(format!("{err:#}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::Environment(_)
            | Self::Permission
            | Self::Busy { .. }
            | Self::Setup { .. }
            | Self::Io { .. } => ErrorKind::Environment,
            Self::StateUnavailable { .. } | Self::StateCorrupt { .. } => ErrorKind::State,
        }
    }

    /// Advice for apt failures, printed under the error line.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Setup {
                source: SetupError::Apt(apt),
                ..
            } => Some(apt.category().advice()),
            _ => None,
        }
    }
}

impl From<UnknownKeyword> for Error {
    fn from(err: UnknownKeyword) -> Self {
        Self::Usage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_only_for_apt_failures() {
        let locked = Error::Setup {
            keyword: "base".to_string(),
            verb: "install",
            source: SetupError::Apt(aptkit::Error::Locked {
                message: "Could not get lock".to_string(),
            }),
        };
        assert!(locked.hint().unwrap().contains("Wait"));
        assert!(locked.to_string().starts_with("could not install base: "));
        assert_eq!(Error::Permission.hint(), None);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::usage("x").kind(), ErrorKind::Usage);
        assert_eq!(Error::Permission.kind(), ErrorKind::Environment);
        assert_eq!(
            Error::StateUnavailable {
                path: PathBuf::from("/var/lib/tuffix/state.json")
            }
            .kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn test_unknown_keyword_is_usage() {
        let err: Error = UnknownKeyword("doesnotexist".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.to_string().contains("unknown keyword"));
    }

    #[test]
    fn test_busy_message() {
        let err = Error::Busy {
            path: PathBuf::from("/var/lib/tuffix/state.json.lock"),
            holder: Some("pid 42".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "another tuffix process is running (pid 42); lock file /var/lib/tuffix/state.json.lock"
        );
    }
}
