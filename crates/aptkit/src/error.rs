//! Error types for apt operations.
//!
//! Errors are categorized to enable retry logic and appropriate user
//! feedback. apt reports nearly everything through free-form stderr, so the
//! category is recovered by [`Error::from_apt_output`].

use thiserror::Error;

/// Categories of apt errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Another process holds the dpkg/apt lock (transient, retryable)
    Locked,
    /// Package not known to any configured source
    NotFound,
    /// Unmet dependencies or held packages
    Conflict,
    /// Permission denied (not running as root)
    Permission,
    /// apt-get not found on this host
    AptNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked)
    }

    /// One-line hint shown under a failed apt transaction.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Locked => "Wait for the other package manager (e.g. unattended-upgrades) to finish",
            Self::NotFound => "Run 'apt-get update' or verify this is a supported Ubuntu release",
            Self::Conflict => "Resolve the broken packages with 'apt-get -f install'",
            Self::Permission => "Re-run the command with sudo",
            Self::AptNotFound => "This tool requires a Debian-derived distribution",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during apt operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (failed fetch, DNS, etc.)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from apt
        message: String,
    },

    /// The dpkg frontend lock is held by another process
    #[error("package database is locked: {message}")]
    Locked {
        /// Detailed error message from apt
        message: String,
    },

    /// Package not found in any configured source
    #[error("deb package \"{name}\" not found, is this Ubuntu?")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
    },

    /// Unmet dependencies or held broken packages
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// apt-get is not installed or not found in PATH
    #[error("apt-get not found; this does not seem to be a Debian-derived system")]
    AptNotFound,

    /// Command execution failed
    #[error("{message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::AptNotFound => ErrorCategory::AptNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from apt-get output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_apt_output(stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();

        // Lock contention must be checked before permission: apt prints
        // "are you root?" for both.
        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to acquire the dpkg frontend lock")
            || stderr_lower.contains("is another process using it")
        {
            return Error::Locked {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("could not resolve")
            || stderr_lower.contains("could not connect")
            || stderr_lower.contains("connection failed")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("network is unreachable")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("has no installation candidate")
            || stderr_lower.contains("couldn't find any package")
        {
            let name = package_name
                .map(str::to_string)
                .or_else(|| missing_packages(stderr).into_iter().next())
                .unwrap_or_else(|| "unknown".to_string());
            return Error::NotFound { name };
        }

        if stderr_lower.contains("unmet dependencies")
            || stderr_lower.contains("held broken packages")
            || stderr_lower.contains("conflicts:")
        {
            return Error::Conflict {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("permission denied") || stderr_lower.contains("are you root") {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        Error::CommandFailed {
            message: format!(
                "apt-get failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Extract package names from "Unable to locate package" / "has no
/// installation candidate" lines in apt-get stderr.
pub fn missing_packages(stderr: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in stderr.lines() {
        let line = line.trim().trim_start_matches("E:").trim();
        let name = if let Some(rest) = line.strip_prefix("Unable to locate package ") {
            Some(rest.trim())
        } else if let Some(rest) = line.strip_prefix("Package '") {
            rest.split('\'').next().filter(|_| line.contains("has no installation candidate"))
        } else {
            None
        };
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            if !names.iter().any(|n: &String| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Result type for apt operations.
pub type Result<T> = std::result::Result<T, Error>;
